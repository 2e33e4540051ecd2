//! Rank & Hash Engine
//!
//! Maps `(property, media, state, scope)` to a stable identifier and a
//! total order key. Every generated rule asserts `!important`, so source
//! order in the stylesheet is the only tie-break left; the rank decides
//! that order.

/// Size of the master state list; radix of the base rank
pub const STATE_COUNT: usize = 15;

/// Offset per scope position; larger than any base rank
pub const SCOPE_STRIDE: i64 = 100_000;

/// Canonical properties that fit below the scope stride
pub const MAX_PROPERTIES: usize = SCOPE_STRIDE as usize / (STATE_COUNT * STATE_COUNT);

/// Media positions that fit in one base-rank digit
pub const MAX_MEDIA: usize = STATE_COUNT;

/// Rank of a declaration that can never be rendered
pub const UNRENDERABLE: i64 = -1;

/// Dense, collision-free key over property x media x state
pub fn base_rank(property: usize, media: usize, state: usize) -> i64 {
    let s = STATE_COUNT as i64;
    (property as i64 * s + media as i64) * s + state as i64
}

/// Rank offset of a scope, or None if the scope is not configured.
///
/// Positions start at one so any scoped rule sorts after every unscoped
/// rule of the same property. The `+ 1` is intentional: a zero offset
/// would let the first scope tie with unscoped ranks.
pub fn scope_rank(scope: &str, scopes: &[String]) -> Option<i64> {
    scopes
        .iter()
        .position(|s| s == scope)
        .map(|i| (i as i64 + 1) * SCOPE_STRIDE)
}

/// Base rank in hex plus `-scope` when scoped
pub fn identifier(base: i64, scope: &str) -> String {
    if scope.is_empty() {
        format!("{base:x}")
    } else {
        format!("{base:x}-{scope}")
    }
}

/// Identifier and final rank of one declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankKey {
    pub identifier: String,
    pub rank: i64,
}

impl RankKey {
    pub fn is_renderable(&self) -> bool {
        self.rank != UNRENDERABLE
    }
}

/// Compute the rank key; unregistered scopes yield `UNRENDERABLE`
pub fn rank_key(
    property: usize,
    media: usize,
    state: usize,
    scope: &str,
    scopes: &[String],
) -> RankKey {
    let base = base_rank(property, media, state);
    let rank = if scope.is_empty() {
        base
    } else {
        scope_rank(scope, scopes).map_or(UNRENDERABLE, |offset| base + offset)
    };
    RankKey {
        identifier: identifier(base, scope),
        rank,
    }
}

/// Recover the rank from an identifier
pub fn rank_of_identifier(identifier: &str, scopes: &[String]) -> Option<i64> {
    let (hex, scope) = match identifier.split_once('-') {
        Some((hex, scope)) => (hex, scope),
        None => (identifier, ""),
    };
    let base = i64::from_str_radix(hex, 16).ok()?;
    if scope.is_empty() {
        return Some(base);
    }
    scope_rank(scope, scopes).map(|offset| base + offset)
}
