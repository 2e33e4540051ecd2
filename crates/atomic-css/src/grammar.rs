//! Attribute Grammar
//!
//! `(<media>|)?(<scope>!)?<property>(.<state>)?(:<value>)?` tokens,
//! separated by `;`. A `\;` embeds a literal semicolon and a backslash
//! before a line break joins the lines. Tokens starting with `^` are
//! mixin references whose arguments are split on commas outside
//! parentheses.
//!
//! This module only checks shape. Whether a media, scope or state is
//! configured is decided by the resolver.

use std::sync::OnceLock;

use regex::Regex;

/// Marker that starts a mixin reference
pub const MIXIN_MARKER: char = '^';

/// One parsed declaration token, not yet validated against configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationToken {
    pub media: Option<String>,
    pub scope: Option<String>,
    pub property: String,
    pub state: Option<String>,
    pub value: Option<String>,
}

/// A `^name:args` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinRef {
    pub name: String,
    pub args: Vec<String>,
}

/// A token from an attribute string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Declaration(DeclarationToken),
    Mixin(MixinRef),
}

fn declaration_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^(?:([a-z]{2})\|)?(?:([A-Za-z0-9-]+)!)?(-?[a-z][a-z0-9-]*)(?:\.([a-z][a-z-]*))?$")
            .unwrap_or_else(|err| panic!("invalid declaration regex: {err}"))
    })
}

fn mixin_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|err| panic!("invalid mixin regex: {err}"))
    })
}

/// Split an attribute string into trimmed, non-empty tokens
pub fn split_declarations(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(';') => {
                    current.push(';');
                    chars.next();
                }
                Some('\n') => {
                    chars.next();
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                _ => current.push('\\'),
            },
            ';' => {
                push_token(&mut tokens, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_token(&mut tokens, &current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, token: &str) {
    let token = token.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
}

/// Split on commas that are not inside parentheses
pub fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(args[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = args[start..].trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(last.to_string());
    }
    out
}

/// Parse one token; None means the token is malformed and dropped
pub fn parse_item(token: &str) -> Option<Item> {
    let (head, value) = match token.split_once(':') {
        Some((head, value)) => (head.trim(), Some(value.trim())),
        None => (token.trim(), None),
    };

    if let Some(name) = head.strip_prefix(MIXIN_MARKER) {
        if !mixin_shape().is_match(name) {
            return None;
        }
        return Some(Item::Mixin(MixinRef {
            name: name.to_string(),
            args: value.map(split_args).unwrap_or_default(),
        }));
    }

    let caps = declaration_shape().captures(head)?;
    let text = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
    Some(Item::Declaration(DeclarationToken {
        media: text(1),
        scope: text(2),
        property: text(3)?,
        state: text(4),
        value: value.filter(|v| !v.is_empty()).map(str::to_string),
    }))
}

/// Split and parse a full attribute string, dropping malformed tokens
pub fn parse_items(content: &str) -> Vec<Item> {
    split_declarations(content)
        .iter()
        .filter_map(|token| parse_item(token))
        .collect()
}
