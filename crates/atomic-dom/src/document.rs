//! Document - arena tree with mutation recording

use crate::{
    DomError, DomResult, InlineStyle, MutationQueue, MutationRecord, Node, NodeId, ShadowRoot,
    ShadowRootMode,
};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    /// Pending mutation records
    mutations: MutationQueue,
}

impl Document {
    /// Create a new document with `<html>` and `<body>`
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node::document()],
            html_element: NodeId::ROOT,
            body_element: NodeId::ROOT,
            mutations: MutationQueue::new(),
        };
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.link(NodeId::ROOT, html);
        doc.link(html, body);
        doc.html_element = html;
        doc.body_element = body;
        doc
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut crate::ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Number of nodes ever created
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Is `ancestor` an inclusive ancestor of `node`? Shadow children
    /// count as descendants of their host.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Append a child node, detaching it from its previous parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(parent).is_none() {
            return Err(DomError::NotFound(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        self.detach(child)?;
        self.link(parent, child);
        self.mutations.push(MutationRecord::child_added(parent, child));
        Ok(child)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(child).and_then(|n| n.parent) != Some(parent) {
            return Err(DomError::NotFound(child));
        }
        self.detach(child)?;
        Ok(child)
    }

    fn detach(&mut self, child: NodeId) -> DomResult<()> {
        let node = self.get(child).ok_or(DomError::NotFound(child))?;
        let Some(parent) = node.parent else {
            return Ok(());
        };
        let in_shadow = node.in_shadow;
        let parent_node = self.node_mut(parent)?;
        if in_shadow {
            if let Some(shadow) = parent_node.as_element_mut().and_then(|e| e.shadow.as_mut()) {
                shadow.remove_child(child);
            }
        } else {
            parent_node.children.retain(|&c| c != child);
        }
        let node = self.node_mut(child)?;
        node.parent = None;
        node.in_shadow = false;
        self.mutations.push(MutationRecord::child_removed(parent, child));
        Ok(())
    }

    /// Attach a shadow root to an element
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> DomResult<()> {
        let element = self.element_mut(host)?;
        if element.shadow.is_some() {
            return Err(DomError::HierarchyRequest);
        }
        element.shadow = Some(ShadowRoot::new(host, mode));
        Ok(())
    }

    /// Get an element's shadow root
    pub fn shadow_root(&self, host: NodeId) -> Option<&ShadowRoot> {
        self.get(host)?.as_element()?.shadow.as_ref()
    }

    /// Append a node to the shadow root of `host`
    pub fn append_shadow_child(&mut self, host: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.shadow_root(host).is_none() {
            return Err(DomError::HierarchyRequest);
        }
        if self.contains(child, host) {
            return Err(DomError::HierarchyRequest);
        }
        self.detach(child)?;
        if let Some(shadow) = self.element_mut(host)?.shadow.as_mut() {
            shadow.append_child(child);
        }
        let node = self.node_mut(child)?;
        node.parent = Some(host);
        node.in_shadow = true;
        self.mutations.push(MutationRecord::child_added(host, child));
        Ok(child)
    }

    /// Light-tree children
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map_or(&[], |n| n.children.as_slice())
    }

    /// Light-tree children followed by shadow-root children
    pub fn composed_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = self.children(node).to_vec();
        if let Some(shadow) = self.shadow_root(node) {
            out.extend_from_slice(shadow.children());
        }
        out
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(Node::is_element)
    }

    /// Get an attribute value
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node)?.as_element()?.get_attr(name)
    }

    /// Attribute names in insertion order
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.get(node)
            .and_then(Node::as_element)
            .map(|e| e.attributes.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Set an attribute and queue a mutation record carrying the old value
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let old = self.element_mut(node)?.attributes.set(name, value);
        self.mutations
            .push(MutationRecord::attribute(node, name, old.as_deref()));
        Ok(())
    }

    /// Remove an attribute; queues a record only if it existed
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        if let Some(old) = self.element_mut(node)?.attributes.remove(name) {
            self.mutations
                .push(MutationRecord::attribute(node, name, Some(&old)));
        }
        Ok(())
    }

    /// Inline style of an element
    pub fn style(&self, node: NodeId) -> Option<&InlineStyle> {
        self.get(node)?.as_element().map(|e| &e.style)
    }

    /// Mutable inline style of an element
    pub fn style_mut(&mut self, node: NodeId) -> Option<&mut InlineStyle> {
        self.element_mut(node).ok().map(|e| &mut e.style)
    }

    /// Mutation queue configuration
    pub fn mutations_mut(&mut self) -> &mut MutationQueue {
        &mut self.mutations
    }

    /// Take all pending mutation records
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.mutations.take()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
