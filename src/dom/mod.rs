//! In-memory HTML document tree.
//!
//! The storefront page is parsed into an arena of nodes addressed by
//! [`NodeId`]. Removing a node only detaches it from its parent, so handles
//! held elsewhere (for example in the identity table) never dangle; queries
//! start at the document root and therefore never see detached subtrees.

mod parse;
mod selector;
mod serialize;

pub use selector::Selector;

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Payload of a single node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with its attributes in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    /// Creates a detached element with the given attributes.
    pub fn create_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element::new(name);
        for (k, v) in attrs {
            element.attrs.push((k.to_string(), v.to_string()));
        }
        self.push(NodeData::Element(element))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Detaches a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Appends `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Inserts `child` right before `reference`. Returns `false` when the
    /// reference node has no parent.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        self.detach(child);
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        true
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            match element.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.retain(|(k, _)| k != name);
        }
    }

    /// Reads a `data-*` attribute.
    pub fn dataset(&self, node: NodeId, key: &str) -> Option<&str> {
        self.attr(node, &format!("data-{}", key))
    }

    /// Writes a `data-*` attribute.
    pub fn set_dataset(&mut self, node: NodeId, key: &str, value: &str) {
        self.set_attr(node, &format!("data-{}", key), value);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).map(|e| e.has_class(class)).unwrap_or(false)
    }

    /// Adds or removes a class token.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let current = self.attr(node, "class").unwrap_or("").to_string();
        let mut tokens: Vec<&str> = current
            .split_ascii_whitespace()
            .filter(|t| *t != class)
            .collect();
        if on {
            tokens.push(class);
        }
        if tokens.is_empty() {
            self.remove_attr(node, "class");
        } else {
            self.set_attr(node, "class", &tokens.join(" "));
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) | NodeData::Document => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
            _ => {}
        }
    }

    /// Replaces all children of `node` with a single text node. The first
    /// existing text child is rewritten in place so repeated edits do not
    /// grow the arena.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        let mut kept = None;
        for child in children {
            let reuse = kept.is_none()
                && !text.is_empty()
                && matches!(self.nodes[child.0].data, NodeData::Text(_));
            if reuse {
                self.nodes[child.0].data = NodeData::Text(text.to_string());
                kept = Some(child);
            } else {
                self.nodes[child.0].parent = None;
            }
        }
        match kept {
            Some(child) => self.nodes[node.0].children.push(child),
            None if !text.is_empty() => {
                let text_node = self.create_text(text);
                self.append_child(node, text_node);
            }
            None => {}
        }
    }

    /// All nodes below `node` in document (pre-)order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// Elements matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.select_within(self.root(), selector)
    }

    /// Elements below `scope` matching `selector`, in document order.
    pub fn select_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.select_first_within(self.root(), selector)
    }

    pub fn select_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| selector.matches(self, *n))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if selector.matches(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.select_first(&Selector::new("head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.select_first(&Selector::new("body"))
    }

    /// The `<html>` element, if the markup has one.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|n| self.tag_name(*n) == Some("html"))
    }
}
