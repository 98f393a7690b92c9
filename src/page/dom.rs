// Arena-backed element tree mirroring a captured page.
//
// Nodes are never freed: detached subtrees just become unreachable from the
// root, so a NodeId stays a valid index for the lifetime of one Document.
// Scan passes that re-lock the document across awaits compare `generation`
// to spot a page that was replaced underneath them.

use std::collections::BTreeMap;

use crate::page::selector::Selector;

/// Index of an element in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A child slot: either another element or a run of text.
#[derive(Debug, Clone)]
pub enum Child {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Child>,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementData>,
    generation: u64,
}

impl Document {
    /// Empty document with a `body` root.
    pub fn new() -> Self {
        Self::with_root("body")
    }

    pub fn with_root(tag: &str) -> Self {
        Self {
            nodes: vec![ElementData {
                tag: tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
                children: Vec::new(),
                parent: None,
            }],
            generation: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    fn node(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id.0)
    }

    // ── construction ──

    /// Create a detached element. Tags are normalized to lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if let Some(data) = self.node_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.node_mut(parent) {
            data.children.push(Child::Element(child));
        }
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(data) = self.node_mut(parent) {
            data.children.push(Child::Text(text.to_string()));
        }
    }

    pub fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if let Some(data) = self.node_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.node_mut(parent) {
            data.children.insert(0, Child::Element(child));
        }
    }

    /// Replace an element's children wholesale. Element children that get
    /// dropped are orphaned, not freed.
    pub fn replace_children(&mut self, id: NodeId, children: Vec<Child>) {
        if self.node(id).is_none() {
            return;
        }
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old {
            if let Child::Element(e) = child {
                if let Some(data) = self.node_mut(e) {
                    data.parent = None;
                }
            }
        }
        for child in &children {
            if let Child::Element(e) = child {
                if let Some(data) = self.node_mut(*e) {
                    data.parent = Some(id);
                }
            }
        }
        self.nodes[id.0].children = children;
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.replace_children(id, vec![Child::Text(text.to_string())]);
    }

    /// Unlink an element from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(data) = self.node_mut(parent) {
            data.children
                .retain(|c| !matches!(c, Child::Element(e) if *e == id));
        }
        if let Some(data) = self.node_mut(id) {
            data.parent = None;
        }
    }

    // ── inspection ──

    pub fn tag(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| n.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attrs.get(name)).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(data) = self.node_mut(id) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(data) = self.node_mut(id) {
            data.attrs.remove(name);
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    pub fn children(&self, id: NodeId) -> &[Child] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .filter_map(|c| match c {
                Child::Element(e) => Some(*e),
                Child::Text(_) => None,
            })
            .collect()
    }

    pub fn child_element_count(&self, id: NodeId) -> usize {
        self.child_elements(id).len()
    }

    /// Concatenated text of the subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(e) => self.collect_text(*e, out),
            }
        }
    }

    /// Every element below `id` in preorder, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.child_elements(id);
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut kids = self.child_elements(node);
            kids.reverse();
            stack.append(&mut kids);
        }
        out
    }

    // ── queries ──

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        selector.matches(self, id)
    }

    /// All matching elements in the document, root included, document order.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        let root = self.root();
        let mut out = Vec::new();
        if selector.matches(self, root) {
            out.push(root);
        }
        for node in self.descendants(root) {
            if selector.matches(self, node) {
                out.push(node);
            }
        }
        out
    }

    pub fn find_first(&self, selector: &Selector) -> Option<NodeId> {
        let root = self.root();
        if selector.matches(self, root) {
            return Some(root);
        }
        self.descendants(root)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    /// First match strictly inside `scope`, like `element.querySelector`.
    pub fn find_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| selector.matches(self, n))
    }

    /// Nearest element matching `selector`, starting at `id` itself.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            if selector.matches(self, node) {
                return Some(node);
            }
            cursor = self.parent(node);
        }
        None
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
