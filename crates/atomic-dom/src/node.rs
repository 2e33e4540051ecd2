//! DOM Node
//!
//! Nodes live in the document arena and refer to each other by `NodeId`.
//! Children of a shadow root keep their host as parent and are flagged
//! so tree walks can tell light and shadow content apart.

use crate::{InlineStyle, NamedNodeMap, NodeId, ShadowRoot};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (None if detached or the document itself)
    pub parent: Option<NodeId>,
    /// Child nodes in order
    pub children: Vec<NodeId>,
    /// True when this node is a direct child of a shadow root
    pub in_shadow: bool,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::with_data(NodeData::Text(content.to_string()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    fn with_data(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            in_shadow: false,
            data,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attributes: NamedNodeMap,
    /// Inline style declarations
    pub style: InlineStyle,
    /// Attached shadow root
    pub shadow: Option<ShadowRoot>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: NamedNodeMap::new(),
            style: InlineStyle::new(),
            shadow: None,
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }
}
