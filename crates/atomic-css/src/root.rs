//! Root/Config Value Source
//!
//! Themed custom properties on the document root extend the engine:
//! `--<name>--scope` adds a scope template, `--<name>--mixin` a mixin
//! template and `--<name>--register` a canonical property. Everything is
//! read once; plain value lookups are cached by name.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use atomic_dom::InlineStyle;

const SCOPE_SUFFIX: &str = "--scope";
const MIXIN_SUFFIX: &str = "--mixin";
const REGISTER_SUFFIX: &str = "--register";

/// Built-in scopes in priority order
pub const BUILTIN_SCOPES: &[(&str, &str)] = &[
    ("child", "$selector$state > *{$body}"),
    ("children", "$selector$state *{$body}"),
    ("sibling", "$selector$state > * + *{$body}"),
    ("before", "$selector$state::before{$body}"),
    ("after", "$selector$state::after{$body}"),
    ("placeholder", "$selector$state::placeholder{$body}"),
    ("selection", "$selector$state::selection{$body}"),
    ("group", "[group]$state $selector{$body}"),
    ("dark", "@media (prefers-color-scheme: dark){$selector$state{$body}}"),
    ("light", "@media (prefers-color-scheme: light){$selector$state{$body}}"),
    ("print", "@media print{$selector$state{$body}}"),
];

/// Source of root custom properties (names include the leading `--`)
pub trait ThemeSource {
    fn property_names(&self) -> Vec<String>;
    fn property_value(&self, name: &str) -> Option<String>;
}

impl ThemeSource for InlineStyle {
    fn property_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(name, _)| name.starts_with("--"))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    fn property_value(&self, name: &str) -> Option<String> {
        self.get_property_value(name).map(str::to_string)
    }
}

impl ThemeSource for BTreeMap<String, String> {
    fn property_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn property_value(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Registered property with its vendor spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub property: String,
    pub variants: Vec<String>,
}

/// Scope templates, registrations and cached named values
pub struct Root {
    source: Box<dyn ThemeSource>,
    cache: RefCell<HashMap<String, String>>,
    scopes: Vec<String>,
    templates: HashMap<String, String>,
    registrations: Vec<Registration>,
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("scopes", &self.scopes)
            .field("registrations", &self.registrations)
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

/// Strip one layer of matching quotes and surrounding whitespace
fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl Root {
    /// Read scopes and registrations from `source`
    pub fn load(source: Box<dyn ThemeSource>) -> Self {
        let mut scopes: Vec<String> = BUILTIN_SCOPES.iter().map(|(n, _)| n.to_string()).collect();
        let mut templates: HashMap<String, String> = BUILTIN_SCOPES
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        let mut registrations = Vec::new();

        let mut names = source.property_names();
        names.sort();
        for name in names {
            let Some(bare) = name.strip_prefix("--") else {
                continue;
            };
            let value = source.property_value(&name).unwrap_or_default();
            let value = unquote(&value);

            if let Some(scope) = bare.strip_suffix(SCOPE_SUFFIX) {
                if !scopes.iter().any(|s| s == scope) {
                    scopes.push(scope.to_string());
                }
                templates.insert(scope.to_string(), value.to_string());
            } else if let Some(property) = bare.strip_suffix(REGISTER_SUFFIX) {
                let variants = if value.is_empty() || value == "true" {
                    Vec::new()
                } else {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect()
                };
                registrations.push(Registration {
                    property: property.to_string(),
                    variants,
                });
            }
        }

        tracing::debug!(
            "Root loaded: {} scopes, {} registrations",
            scopes.len(),
            registrations.len()
        );

        Self {
            source,
            cache: RefCell::new(HashMap::new()),
            scopes,
            templates,
            registrations,
        }
    }

    /// Root with built-ins only
    pub fn empty() -> Self {
        Self::load(Box::new(BTreeMap::new()))
    }

    /// Configured scopes in priority order
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Template for a scope; empty when unregistered
    pub fn scope_template(&self, scope: &str) -> &str {
        self.templates.get(scope).map_or("", String::as_str)
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Value of root custom property `--<name>`; empty when missing
    pub fn value(&self, name: &str) -> String {
        if let Some(value) = self.cache.borrow().get(name) {
            return value.clone();
        }
        let value = self
            .source
            .property_value(&format!("--{name}"))
            .map(|v| unquote(&v).to_string())
            .unwrap_or_default();
        self.cache
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        value
    }

    /// Template of `--<name>--mixin`, if declared
    pub fn mixin_template(&self, name: &str) -> Option<String> {
        let template = self.value(&format!("{name}{MIXIN_SUFFIX}"));
        (!template.is_empty()).then_some(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme(pairs: &[(&str, &str)]) -> Box<dyn ThemeSource> {
        Box::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_builtin_scopes() {
        let root = Root::empty();
        assert_eq!(root.scopes()[0], "child");
        assert_eq!(root.scope_template("child"), "$selector$state > *{$body}");
        assert_eq!(root.scope_template("nowhere"), "");
    }

    #[test]
    fn test_registered_scope_appended() {
        let root = Root::load(theme(&[
            ("--odd-rows--scope", "\"$selector tr:nth-child(odd){$body}\""),
            ("--child--scope", "$selector > :not(template){$body}"),
        ]));
        assert_eq!(root.scopes().last().map(String::as_str), Some("odd-rows"));
        assert_eq!(root.scope_template("odd-rows"), "$selector tr:nth-child(odd){$body}");
        // Overriding a built-in keeps its position
        assert_eq!(root.scopes()[0], "child");
        assert_eq!(root.scope_template("child"), "$selector > :not(template){$body}");
    }

    #[test]
    fn test_registrations() {
        let root = Root::load(theme(&[
            ("--text-wrap--register", "true"),
            ("--field-sizing--register", ""),
            ("--line-clamp--register", "-webkit-line-clamp, -moz-line-clamp"),
        ]));
        let regs = root.registrations();
        assert_eq!(regs.len(), 3);
        assert_eq!(regs[0].property, "field-sizing");
        assert!(regs[0].variants.is_empty());
        assert_eq!(regs[1].property, "line-clamp");
        assert_eq!(regs[1].variants, vec!["-webkit-line-clamp", "-moz-line-clamp"]);
        assert_eq!(regs[2].property, "text-wrap");
    }

    #[test]
    fn test_value_lookup_cached() {
        let root = Root::load(theme(&[("--brand", " 'teal' "), ("--card--mixin", "p:4")]));
        assert_eq!(root.value("brand"), "teal");
        assert_eq!(root.value("brand"), "teal");
        assert_eq!(root.value("missing"), "");
        assert_eq!(root.mixin_template("card").as_deref(), Some("p:4"));
        assert_eq!(root.mixin_template("missing"), None);
    }

    #[test]
    fn test_inline_style_source() {
        let mut style = InlineStyle::new();
        style.set_property("--brand", "teal");
        style.set_property("color", "red");
        assert_eq!(style.property_names(), vec!["--brand".to_string()]);
        let root = Root::load(Box::new(style));
        assert_eq!(root.value("brand"), "teal");
    }
}
