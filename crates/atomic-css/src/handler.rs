//! Reconciler (StyleHandler)
//!
//! Diffs an element's newly resolved declarations against what was applied
//! last time, updates inline custom properties and the marker attribute,
//! and lazily generates one backing rule per identifier.
//!
//! The handler keeps no per-element memory: callers pass the previously
//! applied entries in and store the returned list.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::mixins::{MixinOutput, MixinRegistry};
use crate::properties::{state_selector, PropertyTable};
use crate::rank::rank_of_identifier;
use crate::resolve::{Declaration, Resolver};
use crate::root::Root;
use crate::settings::Settings;
use crate::tracker::{rule_identifier, RuleSink, RuleTracker};
use crate::StyleError;

/// Element operations the reconciler needs from the host document
pub trait StyleHost {
    type Node: Copy + Eq + Hash + fmt::Debug;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: Self::Node, name: &str);

    /// Set an inline style property (`--<id>` custom properties)
    fn set_style_property(&mut self, node: Self::Node, property: &str, value: &str);

    fn remove_style_property(&mut self, node: Self::Node, property: &str);

    fn attribute_names(&self, node: Self::Node) -> Vec<String>;

    /// Children to observe, shadow-root children included
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Whether `node` is `ancestor` or lies in its composed subtree
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool;
}

/// One declaration as applied to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEntry {
    /// Declaration key, e.g. `md|color.hover`
    pub name: String,
    /// Identifier listed in the marker attribute
    pub entry: String,
    /// Inline custom property, `--<entry>`
    pub property: String,
    pub value: String,
}

fn template_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$(selector|body|class|value|property|state|variants|var)")
            .unwrap_or_else(|err| panic!("invalid template regex: {err}"))
    })
}

/// Resolves, reconciles and generates rules into a sheet
#[derive(Debug)]
pub struct StyleHandler<S> {
    settings: Settings,
    table: PropertyTable,
    mixins: MixinRegistry,
    root: Root,
    tracker: RuleTracker,
    sheet: S,
}

impl<S: RuleSink> StyleHandler<S> {
    /// Create a handler; root registrations extend the property table
    pub fn new(settings: Settings, root: Root, sheet: S) -> Self {
        let mut table = PropertyTable::new();
        for registration in root.registrations() {
            table.register(&registration.property, &registration.variants);
        }
        Self {
            settings,
            table,
            mixins: MixinRegistry::default(),
            root,
            tracker: RuleTracker::new(),
            sheet,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    pub fn tracker(&self) -> &RuleTracker {
        &self.tracker
    }

    pub fn sheet(&self) -> &S {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut S {
        &mut self.sheet
    }

    /// Register a mixin; the last registration for a name wins
    pub fn register_mixin<F, O>(&mut self, name: &str, callback: F)
    where
        F: Fn(&Settings, &[String]) -> O + Send + Sync + 'static,
        O: Into<MixinOutput>,
    {
        self.mixins.register(name, callback);
    }

    /// Append a canonical property; false when the table is full
    pub fn register_property(&mut self, name: &str, variants: &[String]) -> bool {
        self.table.register(name, variants)
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.settings, &self.table, &self.mixins, &self.root)
    }

    /// Resolve `content` in source order
    pub fn resolve(&self, content: &str) -> Result<Vec<Declaration>, StyleError> {
        self.resolver().resolve(content)
    }

    /// Reconcile one element.
    ///
    /// `previous` is exactly what the last call returned for this node;
    /// `None` content removes everything. On a mixin cycle nothing is
    /// applied and the error propagates.
    pub fn handle_change<H: StyleHost>(
        &mut self,
        host: &mut H,
        node: H::Node,
        previous: &[AppliedEntry],
        content: Option<&str>,
    ) -> Result<Vec<AppliedEntry>, StyleError> {
        let declarations = match content {
            Some(content) => self.resolve(content)?,
            None => Vec::new(),
        };

        // Last occurrence of a key wins, keeping first-seen order
        let mut order: Vec<Declaration> = Vec::with_capacity(declarations.len());
        let mut slots: HashMap<String, usize> = HashMap::new();
        for declaration in declarations {
            if !declaration.key.is_renderable() {
                self.tracker.mark_seen(declaration.identifier());
                continue;
            }
            match slots.get(&declaration.name()) {
                Some(&slot) => order[slot] = declaration,
                None => {
                    slots.insert(declaration.name(), order.len());
                    order.push(declaration);
                }
            }
        }

        let previous_by_name: HashMap<&str, &AppliedEntry> =
            previous.iter().map(|e| (e.name.as_str(), e)).collect();
        let mut active_properties: HashSet<String> = HashSet::new();
        let mut applied = Vec::with_capacity(order.len());

        for declaration in &order {
            let entry = AppliedEntry {
                name: declaration.name(),
                entry: declaration.identifier().to_string(),
                property: format!("--{}", declaration.identifier()),
                value: declaration.value.clone(),
            };
            let unchanged = previous_by_name
                .get(entry.name.as_str())
                .is_some_and(|old| old.property == entry.property && old.value == entry.value);
            if !unchanged {
                host.set_style_property(node, &entry.property, &entry.value);
            }
            if self.tracker.mark_seen(&entry.entry) {
                self.generate_rule(declaration);
            }
            active_properties.insert(entry.property.clone());
            applied.push(entry);
        }

        for old in previous {
            if !active_properties.contains(&old.property) {
                host.remove_style_property(node, &old.property);
            }
        }

        let marker = &self.settings.marker_attribute;
        let ids: Vec<&str> = applied.iter().map(|e| e.entry.as_str()).collect();
        let current = host.attribute(node, marker);
        if ids.is_empty() {
            if current.is_some() {
                host.remove_attribute(node, marker);
            }
        } else {
            let list = ids.join(" ");
            if current.as_deref() != Some(list.as_str()) {
                host.set_attribute(node, marker, &list);
            }
        }

        tracing::debug!(
            "Reconciled {:?}: {} previous, {} applied",
            node,
            previous.len(),
            applied.len()
        );
        Ok(applied)
    }

    /// Rule text for a declaration; None when its scope has no template
    pub fn build_rule(&self, declaration: &Declaration) -> Option<String> {
        let id = declaration.identifier();
        let var = format!("var(--{id})");
        let variants: String = self
            .table
            .variants(&declaration.property)
            .iter()
            .map(|variant| format!("{variant}:{var} !important;"))
            .collect();
        let body = format!("{variants}{}:{var} !important", declaration.property);
        let selector = format!("[{}~=\"{id}\"]", self.settings.marker_attribute);
        let state = state_selector(declaration.state);

        let rule = if declaration.scope.is_empty() {
            format!("{selector}{state}{{{body}}}")
        } else {
            let template = self.root.scope_template(&declaration.scope);
            if template.is_empty() {
                return None;
            }
            template_placeholder()
                .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                    "selector" => selector.clone(),
                    "body" => body.clone(),
                    "class" => id.to_string(),
                    "value" => declaration.value.clone(),
                    "property" => declaration.property.clone(),
                    "state" => state.to_string(),
                    "variants" => variants.clone(),
                    _ => var.clone(),
                })
                .into_owned()
        };

        let media = self.settings.media();
        match media
            .get(declaration.media_index)
            .and_then(|m| m.query.as_deref())
        {
            Some(query) => Some(format!("@media {query}{{{rule}}}")),
            None => Some(rule),
        }
    }

    /// Build and insert the rule for a declaration.
    ///
    /// Rejected rules are logged; the identifier stays seen.
    pub fn generate_rule(&mut self, declaration: &Declaration) -> Option<usize> {
        let rule = self.build_rule(declaration)?;
        match self
            .tracker
            .insert(&mut self.sheet, &rule, declaration.rank())
        {
            Ok(index) => Some(index),
            Err(err) => {
                tracing::warn!("Rule for {} not inserted: {}", declaration.name(), err);
                None
            }
        }
    }

    /// Re-insert previously generated rules and mark identifiers seen.
    ///
    /// Each rule's rank is recovered from its identifier; rules whose
    /// identifier or scope is no longer valid are skipped. Returns the
    /// number of rules inserted.
    pub fn restore(&mut self, rules: &[String], seen: &[String]) -> usize {
        for identifier in seen {
            self.tracker.mark_seen(identifier);
        }
        let mut restored = 0;
        for rule in rules {
            let rank = rule_identifier(rule)
                .and_then(|id| rank_of_identifier(id, self.root.scopes()));
            let Some(rank) = rank else {
                tracing::warn!("Skipping cached rule without identifier: {}", rule);
                continue;
            };
            match self.tracker.insert(&mut self.sheet, rule, rank) {
                Ok(_) => restored += 1,
                Err(err) => tracing::warn!("Cached rule not restored: {}", err),
            }
        }
        restored
    }
}
