//! Property Table
//!
//! Canonical property names, aliases, default values, value transforms
//! and vendor variants. The position of a property in the canonical
//! list is its rank weight: shorthands come before their longhands so a
//! longhand intent always lands later in the stylesheet.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::rank::{MAX_PROPERTIES, STATE_COUNT};

/// Master pseudo-state list: name and selector suffix.
///
/// The order is fixed and its length is the rank radix, so it must never
/// depend on which states a deployment enables.
pub const STATES: [(&str, &str); STATE_COUNT] = [
    ("normal", ""),
    ("first", ":first-child"),
    ("last", ":last-child"),
    ("odd", ":nth-child(odd)"),
    ("even", ":nth-child(even)"),
    ("empty", ":empty"),
    ("link", ":link"),
    ("visited", ":visited"),
    ("checked", ":checked"),
    ("focus-within", ":focus-within"),
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("disabled", ":disabled"),
];

/// Index of a state in the master list
pub fn state_index(name: &str) -> Option<usize> {
    STATES.iter().position(|(n, _)| *n == name)
}

/// Selector suffix for a master state index
pub fn state_selector(index: usize) -> &'static str {
    STATES.get(index).map_or("", |(_, s)| s)
}

/// Name of a master state index
pub fn state_name(index: usize) -> &'static str {
    STATES.get(index).map_or("normal", |(n, _)| n)
}

const CANONICAL: &[&str] = &[
    // Box generation
    "display", "position", "box-sizing", "float", "clear", "visibility", "isolation", "content",
    // Offsets
    "inset", "top", "right", "bottom", "left", "z-index",
    // Flexbox
    "flex", "flex-flow", "flex-direction", "flex-wrap", "flex-grow", "flex-shrink", "flex-basis",
    "order",
    // Grid
    "grid", "grid-template", "grid-template-columns", "grid-template-rows",
    "grid-template-areas", "grid-auto-flow", "grid-auto-columns", "grid-auto-rows", "grid-area",
    "grid-column", "grid-column-start", "grid-column-end", "grid-row", "grid-row-start",
    "grid-row-end",
    // Alignment
    "gap", "row-gap", "column-gap", "place-content", "place-items", "place-self",
    "justify-content", "justify-items", "justify-self", "align-content", "align-items",
    "align-self",
    // Sizing
    "width", "min-width", "max-width", "height", "min-height", "max-height", "aspect-ratio",
    // Spacing
    "margin", "margin-top", "margin-right", "margin-bottom", "margin-left",
    "padding", "padding-top", "padding-right", "padding-bottom", "padding-left",
    // Overflow
    "overflow", "overflow-x", "overflow-y", "overscroll-behavior",
    // Borders
    "border", "border-width", "border-style", "border-color",
    "border-top", "border-right", "border-bottom", "border-left",
    "border-top-width", "border-right-width", "border-bottom-width", "border-left-width",
    "border-top-color", "border-right-color", "border-bottom-color", "border-left-color",
    "border-radius", "border-top-left-radius", "border-top-right-radius",
    "border-bottom-right-radius", "border-bottom-left-radius",
    "outline", "outline-width", "outline-style", "outline-color", "outline-offset",
    // Backgrounds
    "background", "background-color", "background-image", "background-position",
    "background-size", "background-repeat", "background-attachment", "background-clip",
    "background-origin",
    // Paint
    "color", "opacity", "box-shadow", "filter", "backdrop-filter", "mix-blend-mode",
    // Text
    "font", "font-family", "font-size", "font-weight", "font-style", "font-variant-numeric",
    "line-height", "letter-spacing", "text-align", "text-decoration", "text-decoration-color",
    "text-transform", "text-overflow", "text-indent", "vertical-align", "white-space",
    "word-break", "overflow-wrap", "hyphens",
    "list-style", "list-style-type", "list-style-position",
    // Replaced content
    "object-fit", "object-position",
    // Tables
    "table-layout", "border-collapse", "border-spacing",
    // Transforms
    "transform", "transform-origin", "translate", "rotate", "scale",
    // Motion
    "transition", "transition-property", "transition-duration", "transition-timing-function",
    "transition-delay", "animation", "will-change",
    // Interaction
    "cursor", "pointer-events", "user-select", "resize", "appearance", "touch-action",
    "scroll-behavior", "scroll-snap-type", "scroll-snap-align", "caret-color", "accent-color",
    // SVG
    "fill", "stroke", "stroke-width",
    // Clipping
    "clip", "clip-path", "mask",
];

const VENDOR_VARIANTS: &[(&str, &[&str])] = &[
    ("user-select", &["-webkit-user-select"]),
    ("backdrop-filter", &["-webkit-backdrop-filter"]),
    ("appearance", &["-webkit-appearance", "-moz-appearance"]),
    ("background-clip", &["-webkit-background-clip"]),
    ("clip-path", &["-webkit-clip-path"]),
    ("mask", &["-webkit-mask"]),
    ("hyphens", &["-webkit-hyphens"]),
];

/// What an alias resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One(&'static str),
    Many(&'static [&'static str]),
}

/// Alias entry
#[derive(Debug, Clone, Copy)]
pub enum Alias {
    /// Single canonical property
    Fixed(&'static str),
    /// Same value broadcast to each property
    FixedList(&'static [&'static str]),
    /// Depends on the raw value (None when no value was written)
    Computed(fn(Option<&str>) -> Target),
}

impl Alias {
    /// Evaluate against a raw value
    pub fn target(self, value: Option<&str>) -> Target {
        match self {
            Self::Fixed(p) => Target::One(p),
            Self::FixedList(list) => Target::Many(list),
            Self::Computed(f) => f(value),
        }
    }
}

fn break_target(value: Option<&str>) -> Target {
    match value {
        Some("words") => Target::One("overflow-wrap"),
        _ => Target::One("word-break"),
    }
}

fn flex_target(value: Option<&str>) -> Target {
    match value {
        Some(v) if !v.is_empty() => Target::One("flex"),
        _ => Target::One("display"),
    }
}

fn grid_target(value: Option<&str>) -> Target {
    match value {
        Some(v) if !v.is_empty() => Target::One("grid"),
        _ => Target::One("display"),
    }
}

/// Alias lookup by written name
pub fn alias(name: &str) -> Option<Alias> {
    use Alias::*;

    Some(match name {
        "w" => Fixed("width"),
        "h" => Fixed("height"),
        "minw" => Fixed("min-width"),
        "maxw" => Fixed("max-width"),
        "minh" => Fixed("min-height"),
        "maxh" => Fixed("max-height"),
        "size" => FixedList(&["width", "height"]),

        "p" => Fixed("padding"),
        "pt" => Fixed("padding-top"),
        "pr" => Fixed("padding-right"),
        "pb" => Fixed("padding-bottom"),
        "pl" => Fixed("padding-left"),
        "px" => FixedList(&["padding-left", "padding-right"]),
        "py" => FixedList(&["padding-top", "padding-bottom"]),

        "m" => Fixed("margin"),
        "mt" => Fixed("margin-top"),
        "mr" => Fixed("margin-right"),
        "mb" => Fixed("margin-bottom"),
        "ml" => Fixed("margin-left"),
        "mx" => FixedList(&["margin-left", "margin-right"]),
        "my" => FixedList(&["margin-top", "margin-bottom"]),

        "inset-x" => FixedList(&["left", "right"]),
        "inset-y" => FixedList(&["top", "bottom"]),
        "z" => Fixed("z-index"),

        "bg" => Fixed("background"),
        "radius" | "rounded" => Fixed("border-radius"),
        "shadow" | "elevation" => Fixed("box-shadow"),
        "fs" => Fixed("font-size"),
        "weight" => Fixed("font-weight"),
        "leading" => Fixed("line-height"),
        "tracking" => Fixed("letter-spacing"),
        "items" => Fixed("align-items"),
        "justify" => Fixed("justify-content"),
        "cols" => Fixed("grid-template-columns"),
        "rows" => Fixed("grid-template-rows"),

        "hidden" => Fixed("display"),
        "relative" | "absolute" | "fixed" | "sticky" => Fixed("position"),

        "break" => Computed(break_target),
        "flex" => Computed(flex_target),
        "grid" => Computed(grid_target),

        _ => return None,
    })
}

/// Value used when an alias is written without one
pub fn default_value(name: &str) -> Option<&'static str> {
    Some(match name {
        "flex" => "flex",
        "grid" => "grid",
        "hidden" => "none",
        "relative" => "relative",
        "absolute" => "absolute",
        "fixed" => "fixed",
        "sticky" => "sticky",
        _ => return None,
    })
}

const SPACING: &[&str] = &[
    "p", "pt", "pr", "pb", "pl", "px", "py",
    "padding", "padding-top", "padding-right", "padding-bottom", "padding-left",
    "m", "mt", "mr", "mb", "ml", "mx", "my",
    "margin", "margin-top", "margin-right", "margin-bottom", "margin-left",
    "gap", "row-gap", "column-gap",
    "inset", "inset-x", "inset-y", "top", "right", "bottom", "left",
    "w", "h", "size", "minw", "maxw", "minh", "maxh",
    "width", "height", "min-width", "max-width", "min-height", "max-height",
];

const FONT_SIZES: &[&str] = &["xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl"];
const RADII: &[&str] = &["none", "sm", "md", "lg", "xl", "full"];
const ELEVATIONS: &[&str] = &["0", "1", "2", "3", "4", "5"];
const TRACKING: &[&str] = &["tighter", "tight", "normal", "wide", "wider", "widest"];
const LEADING: &[&str] = &["none", "tight", "snug", "normal", "relaxed", "loose"];
const SHADOWS: &[&str] = &["sm", "md", "lg", "xl", "2xl", "inner"];

fn numeric_shape() -> &'static Regex {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC.get_or_init(|| {
        Regex::new(r"^-?[0-9]+(\.5)?$").unwrap_or_else(|err| panic!("invalid numeric regex: {err}"))
    })
}

fn themed(value: &str, keywords: &[&str], prefix: &str) -> String {
    if keywords.contains(&value) {
        format!("var(--{prefix}-{value})")
    } else {
        value.to_string()
    }
}

/// Apply the value transform registered for the written (pre-alias) name.
///
/// Unrecognized values pass through unchanged.
pub fn transform_value(name: &str, value: &str, unit: &str) -> String {
    if SPACING.contains(&name) {
        return if numeric_shape().is_match(value) {
            format!("calc({value} * {unit})")
        } else {
            value.to_string()
        };
    }
    match name {
        "fs" | "font-size" => themed(value, FONT_SIZES, "font-size"),
        "radius" | "rounded" | "border-radius" => themed(value, RADII, "radius"),
        "elevation" => themed(value, ELEVATIONS, "elevation"),
        "tracking" | "letter-spacing" => themed(value, TRACKING, "tracking"),
        "leading" | "line-height" => themed(value, LEADING, "leading"),
        "shadow" | "box-shadow" => themed(value, SHADOWS, "shadow"),
        "break" => match value {
            "words" => "break-word".to_string(),
            "all" => "break-all".to_string(),
            other => other.to_string(),
        },
        "cols" | "rows" => match value.parse::<u16>() {
            Ok(n) if n > 0 => format!("repeat({n}, minmax(0, 1fr))"),
            _ => value.to_string(),
        },
        _ => value.to_string(),
    }
}

/// One canonical property bound to its final value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub property: String,
    pub index: usize,
    pub value: String,
}

/// Canonical property list plus runtime registrations
#[derive(Debug, Clone)]
pub struct PropertyTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
    variants: HashMap<String, Vec<String>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        let names: Vec<String> = CANONICAL.iter().map(|s| s.to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let variants = VENDOR_VARIANTS
            .iter()
            .map(|(p, v)| (p.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        Self {
            names,
            index,
            variants,
        }
    }

    /// Number of canonical properties
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Rank weight of a canonical property
    pub fn index_of(&self, property: &str) -> Option<usize> {
        self.index.get(property).copied()
    }

    /// Canonical name at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Vendor-prefixed spellings written before the canonical property
    pub fn variants(&self, property: &str) -> &[String] {
        self.variants.get(property).map_or(&[], Vec::as_slice)
    }

    /// Register a property at the end of the canonical list.
    ///
    /// Known properties only gain the extra variants. Returns false when
    /// the table is full.
    pub fn register(&mut self, name: &str, variants: &[String]) -> bool {
        if !self.index.contains_key(name) {
            if self.names.len() >= MAX_PROPERTIES {
                tracing::warn!("Property table full, cannot register {}", name);
                return false;
            }
            self.index.insert(name.to_string(), self.names.len());
            self.names.push(name.to_string());
        }
        if !variants.is_empty() {
            let entry = self.variants.entry(name.to_string()).or_default();
            for variant in variants {
                if !entry.contains(variant) {
                    entry.push(variant.clone());
                }
            }
        }
        true
    }

    /// Resolve a written name and raw value into canonical properties.
    ///
    /// An empty result means the declaration is dropped: unknown
    /// property, or no value and no default.
    pub fn resolve(&self, name: &str, value: Option<&str>, unit: &str) -> Vec<Resolved> {
        let value = value.filter(|v| !v.is_empty());
        let targets: Vec<&str> = match alias(name).map(|a| a.target(value)) {
            Some(Target::One(p)) => vec![p],
            Some(Target::Many(list)) => list.to_vec(),
            None => vec![name],
        };
        let Some(raw) = value.or_else(|| default_value(name)) else {
            return Vec::new();
        };
        let value = transform_value(name, raw, unit);

        targets
            .into_iter()
            .filter_map(|property| {
                let index = self.index_of(property)?;
                Some(Resolved {
                    property: property.to_string(),
                    index,
                    value: value.clone(),
                })
            })
            .collect()
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}
