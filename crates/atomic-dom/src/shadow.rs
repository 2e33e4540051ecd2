//! Shadow DOM
//!
//! Shadow roots attached to host elements.

use crate::NodeId;

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Shadow root
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    pub host: NodeId,
    pub mode: ShadowRootMode,
    children: Vec<NodeId>,
}

impl ShadowRoot {
    /// Create a new shadow root
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            children: Vec::new(),
        }
    }

    /// Get children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Add a child
    pub fn append_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Remove a child, returning whether it was present
    pub fn remove_child(&mut self, child: NodeId) -> bool {
        match self.children.iter().position(|&c| c == child) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }
}
