//! Declaration resolution
//!
//! Turns an attribute string into fully resolved declarations: tokens are
//! parsed, mixins expanded, media/scope/state checked against the
//! configuration, value references substituted, aliases fanned out and
//! every canonical property ranked.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::grammar::{parse_items, DeclarationToken};
use crate::mixins::MixinRegistry;
use crate::properties::{state_index, state_name, PropertyTable};
use crate::rank::{rank_key, RankKey};
use crate::root::Root;
use crate::settings::{Media, Settings};
use crate::StyleError;

/// One resolved style intent bound to a canonical property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub media: String,
    pub media_index: usize,
    /// Empty when unscoped
    pub scope: String,
    pub property: String,
    pub property_index: usize,
    pub state: usize,
    pub value: String,
    pub key: RankKey,
}

impl Declaration {
    /// Human-readable key: `[media|][scope!]property[.state]`
    pub fn name(&self) -> String {
        let mut name = String::new();
        if self.media_index != 0 {
            name.push_str(&self.media);
            name.push('|');
        }
        if !self.scope.is_empty() {
            name.push_str(&self.scope);
            name.push('!');
        }
        name.push_str(&self.property);
        if self.state != 0 {
            name.push('.');
            name.push_str(state_name(self.state));
        }
        name
    }

    pub fn identifier(&self) -> &str {
        &self.key.identifier
    }

    pub fn rank(&self) -> i64 {
        self.key.rank
    }
}

fn reference() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| {
        Regex::new(r"([@&])([A-Za-z][A-Za-z0-9_-]*)")
            .unwrap_or_else(|err| panic!("invalid reference regex: {err}"))
    })
}

/// Replace `@name` with `var(--name)` and `&name` with the root value
pub fn substitute_references(value: &str, root: &Root) -> String {
    if !value.contains(['@', '&']) {
        return value.to_string();
    }
    reference()
        .replace_all(value, |caps: &Captures<'_>| match &caps[1] {
            "@" => format!("var(--{})", &caps[2]),
            _ => root.value(&caps[2]),
        })
        .into_owned()
}

/// Borrowed view over everything needed to resolve declarations
#[derive(Debug)]
pub struct Resolver<'a> {
    settings: &'a Settings,
    table: &'a PropertyTable,
    mixins: &'a MixinRegistry,
    root: &'a Root,
    media: Vec<Media>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        settings: &'a Settings,
        table: &'a PropertyTable,
        mixins: &'a MixinRegistry,
        root: &'a Root,
    ) -> Self {
        Self {
            settings,
            table,
            mixins,
            root,
            media: settings.media(),
        }
    }

    /// Resolve a full attribute string in source order.
    ///
    /// Unknown media, scopes, states and properties are dropped. Only a
    /// mixin cycle is an error.
    pub fn resolve(&self, content: &str) -> Result<Vec<Declaration>, StyleError> {
        let tokens = self
            .mixins
            .expand(parse_items(content), self.settings, self.root)?;
        Ok(tokens
            .into_iter()
            .flat_map(|token| self.resolve_token(token))
            .collect())
    }

    /// Resolve one declaration token; unscoped or unregistered-scope
    /// declarations are both returned, the latter with an unrenderable rank
    pub fn resolve_token(&self, token: DeclarationToken) -> Vec<Declaration> {
        let (media_index, media) = match token.media.as_deref() {
            None => (0, "all"),
            Some(name) => match self.media.iter().position(|m| m.name == name) {
                Some(index) => (index, name),
                None => return Vec::new(),
            },
        };
        let state = match token.state.as_deref() {
            None => 0,
            Some(name) if self.settings.state_enabled(name) => match state_index(name) {
                Some(index) => index,
                None => return Vec::new(),
            },
            Some(_) => return Vec::new(),
        };
        let scope = token.scope.unwrap_or_default();

        let value = token
            .value
            .map(|v| substitute_references(&v, self.root));
        self.table
            .resolve(&token.property, value.as_deref(), &self.settings.unit)
            .into_iter()
            .map(|resolved| Declaration {
                media: media.to_string(),
                media_index,
                key: rank_key(
                    resolved.index,
                    media_index,
                    state,
                    &scope,
                    self.root.scopes(),
                ),
                scope: scope.clone(),
                property: resolved.property,
                property_index: resolved.index,
                state,
                value: resolved.value,
            })
            .collect()
    }

    /// Media entry for an index
    pub fn media(&self, index: usize) -> Option<&Media> {
        self.media.get(index)
    }
}
