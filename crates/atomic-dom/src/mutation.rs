//! Mutation Records
//!
//! The document queues a record for every structural change and every
//! attribute change, in the spirit of `MutationObserver`: consumers take
//! the pending batch and react to it as a whole.

use std::collections::HashSet;

use crate::NodeId;

/// A single queued mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Children were added to or removed from `target`
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// Attribute `name` of `target` changed; `old_value` is the prior value
    Attributes {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
}

impl MutationRecord {
    /// Create a child-added record
    pub fn child_added(target: NodeId, child: NodeId) -> Self {
        Self::ChildList {
            target,
            added: vec![child],
            removed: Vec::new(),
        }
    }

    /// Create a child-removed record
    pub fn child_removed(target: NodeId, child: NodeId) -> Self {
        Self::ChildList {
            target,
            added: Vec::new(),
            removed: vec![child],
        }
    }

    /// Create an attribute-modified record
    pub fn attribute(target: NodeId, name: &str, old_value: Option<&str>) -> Self {
        Self::Attributes {
            target,
            name: name.to_string(),
            old_value: old_value.map(str::to_string),
        }
    }

    /// Node the record is about
    pub fn target(&self) -> NodeId {
        match self {
            Self::ChildList { target, .. } | Self::Attributes { target, .. } => *target,
        }
    }
}

/// Pending mutation records with an optional attribute filter
#[derive(Debug, Default)]
pub struct MutationQueue {
    records: Vec<MutationRecord>,
    attribute_filter: Option<HashSet<String>>,
    attribute_prefix: Option<String>,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only queue attribute records for these names
    pub fn set_attribute_filter<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_filter = Some(names.into_iter().map(Into::into).collect());
    }

    /// Also queue attribute records whose name starts with `prefix`
    pub fn set_attribute_prefix(&mut self, prefix: Option<&str>) {
        self.attribute_prefix = prefix.map(str::to_string);
    }

    /// Whether an attribute change should be queued
    pub fn wants_attribute(&self, name: &str) -> bool {
        let Some(filter) = &self.attribute_filter else {
            return true;
        };
        filter.contains(name)
            || self
                .attribute_prefix
                .as_deref()
                .is_some_and(|prefix| name.starts_with(prefix))
    }

    pub fn push(&mut self, record: MutationRecord) {
        if let MutationRecord::Attributes { name, .. } = &record {
            if !self.wants_attribute(name) {
                return;
            }
        }
        self.records.push(record);
    }

    /// Take all pending records
    pub fn take(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
