//! Atomic DOM - host document model
//!
//! A small arena DOM that plays the role of the live document the style
//! engine observes: elements with attributes and inline style
//! declarations, shadow roots, a CSSOM-like rule list, a key/value
//! storage area and a queue of mutation records.

mod attributes;
mod document;
mod mutation;
mod node;
mod shadow;
mod storage;
mod style;
mod stylesheet;

pub use attributes::{Attr, NamedNodeMap};
pub use document::Document;
pub use mutation::{MutationRecord, MutationQueue};
pub use node::{ElementData, Node, NodeData};
pub use shadow::{ShadowRoot, ShadowRootMode};
pub use storage::Storage;
pub use style::InlineStyle;
pub use stylesheet::StyleSheet;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node
    pub const ROOT: NodeId = NodeId(0);

    /// Raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0:?}")]
    NotFound(NodeId),

    #[error("Node is not an element: {0:?}")]
    NotAnElement(NodeId),

    #[error("Hierarchy request error")]
    HierarchyRequest,

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Index {index} out of range for {length} rules")]
    IndexSize { index: usize, length: usize },
}
