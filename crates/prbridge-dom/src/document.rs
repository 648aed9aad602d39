use thiserror::Error;

use crate::selector::{Selector, SelectorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercased tag name.
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
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

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One observed structural or attribute change, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid hierarchy: {0}")]
    Hierarchy(String),

    #[error("Not an element: {0}")]
    NotAnElement(NodeId),
}

/// Arena-backed document tree. Node ids are never reused, so a handle to a
/// removed node stays valid (it is simply detached).
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    records: Vec<MutationRecord>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            records: Vec::new(),
        }
    }

    pub fn parse(html: &str) -> Self {
        crate::parser::parse(html)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<body>` element when present, otherwise the root.
    pub fn body(&self) -> NodeId {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag_name(*id) == Some("body"))
            .unwrap_or_else(|| self.root())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].children.is_empty()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Parent only when it is an element (never the document root).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Proper ancestors, nearest first, up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Concatenated text of every descendant text node, like DOM `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeData::Text(text)) = self.data(id) {
            return text.clone();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeData::Text(text)) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Comment(text.to_string()))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => el.set_attr(name, value),
            _ => return Err(DomError::NotAnElement(id)),
        }
        self.records.push(MutationRecord::Attributes {
            target: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        let el = self.element(id).ok_or(DomError::NotAnElement(id))?;
        if el.has_class(class) {
            return Ok(());
        }
        let joined = match el.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &joined)
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.contains(parent) {
            return Err(DomError::UnknownNode(parent));
        }
        if !self.contains(child) {
            return Err(DomError::UnknownNode(child));
        }
        if child == self.root() {
            return Err(DomError::Hierarchy("the root cannot be moved".into()));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::Hierarchy(format!(
                "{} cannot be inserted into its own subtree",
                child
            )));
        }
        if matches!(
            self.data(parent),
            Some(NodeData::Text(_) | NodeData::Comment(_))
        ) {
            return Err(DomError::Hierarchy(format!("{} cannot have children", parent)));
        }
        Ok(())
    }

    fn detach_silently(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent.take()?;
        self.nodes[parent.0].children.retain(|c| *c != id);
        Some(parent)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        if let Some(old) = self.detach_silently(child) {
            self.records.push(MutationRecord::ChildList {
                target: old,
                added: Vec::new(),
                removed: vec![child],
            });
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Inserts `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self
            .parent(reference)
            .ok_or_else(|| DomError::Hierarchy(format!("{} has no parent", reference)))?;
        self.check_insertion(parent, node)?;
        if let Some(old) = self.detach_silently(node) {
            self.records.push(MutationRecord::ChildList {
                target: old,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        let siblings = &mut self.nodes[parent.0].children;
        let at = siblings
            .iter()
            .position(|c| *c == reference)
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(at, node);
        self.nodes[node.0].parent = Some(parent);
        self.records.push(MutationRecord::ChildList {
            target: parent,
            added: vec![node],
            removed: Vec::new(),
        });
        Ok(())
    }

    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if !self.contains(id) {
            return Err(DomError::UnknownNode(id));
        }
        if id == self.root() {
            return Err(DomError::Hierarchy("the root cannot be removed".into()));
        }
        if let Some(parent) = self.detach_silently(id) {
            self.records.push(MutationRecord::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![id],
            });
        }
        Ok(())
    }

    pub(crate) fn push_element(&mut self, element: ElementData) -> NodeId {
        self.push_node(NodeData::Element(element))
    }

    /// Appends text under `parent` while building a tree, merging with a
    /// trailing text child. Not observed as a mutation.
    pub(crate) fn append_text_silently(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.nodes[parent.0].children.last().copied() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                existing.push_str(text);
                return;
            }
        }
        let id = self.push_node(NodeData::Text(text.to_string()));
        self.attach(parent, id);
    }

    /// Appends a child while building a tree; not observed as a mutation.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Deep copy of `id` into a fresh document, as the root's only child (or,
    /// when `id` is the root, the root's children).
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let mut out = Document::new();
        let out_root = out.root();
        if id == self.root() {
            for child in self.children(id) {
                self.copy_into(*child, &mut out, out_root);
            }
        } else if self.contains(id) {
            self.copy_into(id, &mut out, out_root);
        }
        out
    }

    fn copy_into(&self, id: NodeId, out: &mut Document, parent: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let copy = out.push_node(node.data.clone());
        out.attach(parent, copy);
        for child in &node.children {
            self.copy_into(*child, out, copy);
        }
    }

    /// Parses `html` and appends the resulting nodes to `parent`, like
    /// `insertAdjacentHTML("beforeend", ..)`. Returns the new top-level nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let fragment = Document::parse(html);
        let mut added = Vec::new();
        for child in fragment.children(fragment.root()) {
            let copy = self.import_node(&fragment, *child);
            self.append_child(parent, copy)?;
            added.push(copy);
        }
        Ok(added)
    }

    /// Detached deep copy of a node from another document.
    fn import_node(&mut self, from: &Document, id: NodeId) -> NodeId {
        let data = from
            .data(id)
            .cloned()
            .unwrap_or_else(|| NodeData::Text(String::new()));
        let copy = self.push_node(data);
        for child in from.children(id) {
            let child_copy = self.import_node(from, *child);
            self.attach(copy, child_copy);
        }
        copy
    }

    /// Drains the pending mutation batch.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn has_pending_records(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(selector.matches(self, id))
    }

    pub fn query_selector(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self, *id)))
    }

    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect())
    }

    /// `id` itself or its nearest ancestor matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        if selector.matches(self, id) {
            return Ok(Some(id));
        }
        Ok(self.ancestors(id).find(|a| selector.matches(self, *a)))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
