//! Host bindings for the atomic-dom document model

use atomic_dom::{Document, NodeId, StyleSheet};

use crate::handler::StyleHost;
use crate::tracker::RuleSink;
use crate::StyleError;

impl StyleHost for Document {
    type Node = NodeId;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get_attribute(node, name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Err(err) = Document::set_attribute(self, node, name, value) {
            tracing::warn!("Cannot set {} on {:?}: {}", name, node, err);
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Err(err) = Document::remove_attribute(self, node, name) {
            tracing::warn!("Cannot remove {} from {:?}: {}", name, node, err);
        }
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(style) = self.style_mut(node) {
            style.set_property(property, value);
        }
    }

    fn remove_style_property(&mut self, node: NodeId, property: &str) {
        if let Some(style) = self.style_mut(node) {
            style.remove_property(property);
        }
    }

    fn attribute_names(&self, node: NodeId) -> Vec<String> {
        Document::attribute_names(self, node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.composed_children(node)
            .into_iter()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        Document::contains(self, ancestor, node)
    }
}

impl RuleSink for StyleSheet {
    fn insert_rule(&mut self, rule: &str, index: usize) -> Result<(), StyleError> {
        StyleSheet::insert_rule(self, rule, index)
            .map(|_| ())
            .map_err(|err| StyleError::Insert {
                rule: rule.to_string(),
                reason: err.to_string(),
            })
    }

    fn rule_count(&self) -> usize {
        self.len()
    }
}
