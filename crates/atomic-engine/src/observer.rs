//! Observation Layer
//!
//! Owns the per-node memory of applied entries and decides what gets
//! reconciled for a batch of mutations: removed subtrees are forgotten
//! first, added subtrees are discovered, then changed attributes are
//! reconciled once per node.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use atomic_css::{AppliedEntry, RuleSink, Settings, StyleError, StyleHandler, StyleHost, MIXIN_MARKER};
use atomic_dom::{MutationRecord, NodeId};

/// Prefix of legacy per-property attributes
pub const LEGACY_PREFIX: &str = "x-";

/// A change reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<N> {
    ChildList {
        target: N,
        added: Vec<N>,
        removed: Vec<N>,
    },
    Attribute {
        target: N,
        name: String,
    },
}

impl From<MutationRecord> for Mutation<NodeId> {
    fn from(record: MutationRecord) -> Self {
        match record {
            MutationRecord::ChildList {
                target,
                added,
                removed,
            } => Self::ChildList {
                target,
                added,
                removed,
            },
            MutationRecord::Attributes { target, name, .. } => Self::Attribute { target, name },
        }
    }
}

/// Combined content of the apply, legacy and style attributes.
///
/// Apply references come first so literal declarations override them.
/// None when the node carries none of the attributes.
pub fn effective_content<H: StyleHost>(
    host: &H,
    node: H::Node,
    settings: &Settings,
) -> Option<String> {
    let mut parts = Vec::new();
    let mut present = false;

    if let Some(apply) = host.attribute(node, &settings.apply_attribute) {
        present = true;
        parts.extend(
            apply
                .split(';')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| match r.strip_prefix(MIXIN_MARKER) {
                    Some(_) => r.to_string(),
                    None => format!("{MIXIN_MARKER}{r}"),
                }),
        );
    }

    if settings.legacy_attributes {
        for name in host.attribute_names(node) {
            let Some(token) = name.strip_prefix(LEGACY_PREFIX) else {
                continue;
            };
            if token.is_empty() || token.contains('!') || token.starts_with(MIXIN_MARKER) {
                continue;
            }
            present = true;
            match host.attribute(node, &name).filter(|v| !v.trim().is_empty()) {
                Some(value) => parts.push(format!("{token}:{}", value.replace(';', "\\;"))),
                None => parts.push(token.to_string()),
            }
        }
    }

    if let Some(style) = host.attribute(node, &settings.style_attribute) {
        present = true;
        parts.push(style);
    }

    present.then(|| parts.join(";"))
}

/// Observed roots plus per-node applied state
#[derive(Debug)]
pub struct Observer<N> {
    roots: Vec<N>,
    tracked: HashMap<N, Vec<AppliedEntry>>,
}

impl<N: Copy + Eq + Hash + std::fmt::Debug> Observer<N> {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            tracked: HashMap::new(),
        }
    }

    /// Whether `node` lies inside an observed root
    pub fn is_observed<H>(&self, host: &H, node: N) -> bool
    where
        H: StyleHost<Node = N>,
    {
        self.roots.iter().any(|&root| host.contains(root, node))
    }

    /// Start observing `root` and reconcile its subtree
    pub fn observe<H, S>(
        &mut self,
        handler: &mut StyleHandler<S>,
        host: &mut H,
        root: N,
    ) -> Result<usize, StyleError>
    where
        H: StyleHost<Node = N>,
        S: RuleSink,
    {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
        self.discover(handler, host, root)
    }

    /// Stop observing `node`: it is no longer a root and its subtree's
    /// state is dropped
    pub fn unobserve<H>(&mut self, host: &H, node: N)
    where
        H: StyleHost<Node = N>,
    {
        self.roots.retain(|&root| root != node);
        self.forget(host, node);
    }

    /// Entries applied to a node, if it is tracked
    pub fn entries(&self, node: N) -> Option<&[AppliedEntry]> {
        self.tracked.get(&node).map(Vec::as_slice)
    }

    pub fn is_tracked(&self, node: N) -> bool {
        self.tracked.contains_key(&node)
    }

    /// Number of tracked nodes
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Reconcile one node against its current attributes
    pub fn reconcile<H, S>(
        &mut self,
        handler: &mut StyleHandler<S>,
        host: &mut H,
        node: N,
    ) -> Result<bool, StyleError>
    where
        H: StyleHost<Node = N>,
        S: RuleSink,
    {
        let content = effective_content(host, node, handler.settings());
        let previous = self.tracked.get(&node).map(Vec::as_slice).unwrap_or(&[]);
        if content.is_none() && previous.is_empty() {
            self.tracked.remove(&node);
            return Ok(false);
        }

        let applied = handler.handle_change(host, node, previous, content.as_deref())?;
        if content.is_none() {
            self.tracked.remove(&node);
        } else {
            self.tracked.insert(node, applied);
        }
        Ok(true)
    }

    /// Reconcile `root` and its whole subtree in document order.
    ///
    /// Returns the number of nodes reconciled.
    pub fn discover<H, S>(
        &mut self,
        handler: &mut StyleHandler<S>,
        host: &mut H,
        root: N,
    ) -> Result<usize, StyleError>
    where
        H: StyleHost<Node = N>,
        S: RuleSink,
    {
        let mut reconciled = 0;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.reconcile(handler, host, node)? {
                reconciled += 1;
            }
            stack.extend(host.children(node).into_iter().rev());
        }
        Ok(reconciled)
    }

    /// Drop state for `root` and its subtree
    pub fn forget<H>(&mut self, host: &H, root: N)
    where
        H: StyleHost<Node = N>,
    {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            self.tracked.remove(&node);
            stack.extend(host.children(node));
        }
    }

    /// Handle one batch of mutations.
    ///
    /// Nodes outside every observed root are ignored, which covers
    /// subtrees removed in the same batch and nodes never attached.
    pub fn process<H, S, I>(
        &mut self,
        handler: &mut StyleHandler<S>,
        host: &mut H,
        mutations: I,
    ) -> Result<(), StyleError>
    where
        H: StyleHost<Node = N>,
        S: RuleSink,
        I: IntoIterator<Item = Mutation<N>>,
    {
        let mutations: Vec<Mutation<N>> = mutations.into_iter().collect();

        for mutation in &mutations {
            if let Mutation::ChildList { removed, .. } = mutation {
                for &node in removed {
                    self.forget(host, node);
                }
            }
        }

        let mut discovered = HashSet::new();
        for mutation in &mutations {
            if let Mutation::ChildList { added, .. } = mutation {
                for &node in added {
                    if self.is_observed(host, node) && discovered.insert(node) {
                        self.discover(handler, host, node)?;
                    }
                }
            }
        }

        let settings = handler.settings();
        let watched = |name: &str| {
            name == settings.style_attribute
                || name == settings.apply_attribute
                || (settings.legacy_attributes && name.starts_with(LEGACY_PREFIX))
        };
        let mut targets = Vec::new();
        let mut seen = HashSet::new();
        for mutation in &mutations {
            if let Mutation::Attribute { target, name } = mutation {
                if watched(name.as_str()) && !discovered.contains(target) && seen.insert(*target) {
                    targets.push(*target);
                }
            }
        }

        for target in targets {
            if self.is_observed(host, target) {
                self.reconcile(handler, host, target)?;
            }
        }
        tracing::debug!(
            "Processed {} mutations, {} nodes tracked",
            mutations.len(),
            self.tracked.len()
        );
        Ok(())
    }
}

impl<N: Copy + Eq + Hash + std::fmt::Debug> Default for Observer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomic_css::Root;
    use atomic_dom::{Document, StyleSheet};

    fn legacy() -> Settings {
        Settings {
            legacy_attributes: true,
            ..Settings::default()
        }
    }

    #[test]
    fn test_effective_content_order() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "css", "color:red").unwrap();
        doc.set_attribute(div, "x-p", "4").unwrap();
        doc.set_attribute(div, "apply", "stack:2; ^center").unwrap();

        assert_eq!(
            effective_content(&doc, div, &legacy()).as_deref(),
            Some("^stack:2;^center;p:4;color:red")
        );
        assert_eq!(
            effective_content(&doc, div, &Settings::default()).as_deref(),
            Some("^stack:2;^center;color:red")
        );
    }

    #[test]
    fn test_effective_content_absent() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(effective_content(&doc, div, &Settings::default()), None);
        doc.set_attribute(div, "css", "").unwrap();
        assert_eq!(
            effective_content(&doc, div, &Settings::default()).as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_legacy_tokens() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "x-flex", "").unwrap();
        doc.set_attribute(div, "x-content", "'a;b'").unwrap();
        doc.set_attribute(div, "x-^center", "").unwrap();
        assert_eq!(
            effective_content(&doc, div, &legacy()).as_deref(),
            Some(r"flex;content:'a\;b'")
        );
    }

    #[test]
    fn test_discover_and_forget() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        let plain = doc.create_element("p");
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.append_child(outer, plain).unwrap();
        doc.set_attribute(outer, "css", "p:2").unwrap();
        doc.set_attribute(inner, "css", "color:red").unwrap();

        let mut handler = StyleHandler::new(Settings::default(), Root::empty(), StyleSheet::new());
        let mut observer = Observer::new();
        let html = doc.document_element();
        let count = observer.discover(&mut handler, &mut doc, html).unwrap();
        assert_eq!(count, 2);
        assert!(observer.is_tracked(inner));
        assert!(!observer.is_tracked(plain));

        observer.forget(&doc, outer);
        assert!(observer.is_empty());
    }

    #[test]
    fn test_observed_roots() {
        let mut doc = Document::new();
        let body = doc.body();
        let inside = doc.create_element("div");
        doc.append_child(body, inside).unwrap();
        let detached = doc.create_element("div");

        let mut handler = StyleHandler::new(Settings::default(), Root::empty(), StyleSheet::new());
        let mut observer = Observer::new();
        assert!(!observer.is_observed(&doc, inside));

        observer.observe(&mut handler, &mut doc, body).unwrap();
        assert!(observer.is_observed(&doc, inside));
        assert!(!observer.is_observed(&doc, detached));
        assert!(!observer.is_observed(&doc, doc.document_element()));

        observer.unobserve(&doc, body);
        assert!(!observer.is_observed(&doc, inside));
    }
}
