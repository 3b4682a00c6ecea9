//! Owned page model the archive is materialized into.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Moving a node with
//! [`Document::append_child`] detaches it from its previous parent, so a
//! subtree is never duplicated.

use indexmap::IndexMap;

mod selector;
mod snapshot;

pub use selector::Selector;
pub use snapshot::{DocumentError, NodeSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: IndexMap<String, String>,
    pub text: Option<String>,
    pub hidden: bool,
    pub disabled: bool,
    pub value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("html")],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find(self.root, &Selector::tag("body"))
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(tag));
        id
    }

    /// Creates an element with its classes taken from a space separated list.
    pub fn create_with_class(&mut self, tag: &str, class: &str) -> NodeId {
        let id = self.create_element(tag);
        self.get_mut(id).classes = class.split_whitespace().map(str::to_string).collect();
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    /// Appends `child` as the last child of `parent`, moving it out of its
    /// current position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_ancestor(child, parent) {
            tracing::warn!(?parent, ?child, "refusing to append a node into its own subtree");
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Removes `id` (and its subtree) from the tree. The nodes stay addressable
    /// so they can be re-attached elsewhere.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.get(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        self.get_mut(id).attrs.insert(name.to_string(), value.into());
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.get_mut(id).text = Some(text.into());
    }

    /// Descendants of `scope` in document order, `scope` excluded.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn find(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self.get(*id)))
    }

    pub fn find_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self.get(*id)))
            .collect()
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if selector.matches(self.get(node)) {
                return Some(node);
            }
            current = self.get(node).parent;
        }
        None
    }

    /// Own text followed by the text of every descendant, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = &self.get(id).text {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = &self.get(node).text {
                out.push_str(text);
            }
        }
        out
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).parent;
        }
        false
    }
}
