//! Arena-backed article tree with re-linking primitives
//!
//! Every rewrite pass works on [`NodeId`] handles. Node ids are collected
//! up front and the tree is mutated afterwards, so a pass must check
//! [`DocTree::is_attached`] before touching an id it collected earlier: an
//! unwrapped or decomposed node stays in the arena but is no longer reachable
//! from the root.

use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use std::fmt::Write as _;

use super::kind::{Kind, KindSet};
use super::node::{Attrs, DocNode, Element, Label};

#[derive(Debug, Clone)]
pub struct DocTree {
    tree: Tree<DocNode>,
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Tree::new(DocNode::Root),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, DocNode>> {
        self.tree.get(id)
    }

    // Ids are only ever handed out by this tree and arena slots are never
    // freed, so a miss here is a programming error.
    fn node_mut(&mut self, id: NodeId) -> NodeMut<'_, DocNode> {
        self.tree
            .get_mut(id)
            .expect("BUG: node id does not belong to this tree")
    }

    // ========================================================================
    // Payload access
    // ========================================================================

    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.tree.get(id).and_then(|n| n.value().as_element())
    }

    /// Run `f` on the element payload of `id`, if it is an element.
    pub fn with_element<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            DocNode::Element(element) => Some(f(element)),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(&self, id: NodeId) -> Option<&Label> {
        self.element(id).map(|e| &e.label)
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<Kind> {
        self.label(id).and_then(Label::kind)
    }

    #[must_use]
    pub fn is_kind(&self, id: NodeId, kind: Kind) -> bool {
        self.kind(id) == Some(kind)
    }

    #[must_use]
    pub fn is_any(&self, id: NodeId, kinds: KindSet) -> bool {
        self.kind(id).is_some_and(|k| kinds.contains(k))
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<Label>) {
        let label = label.into();
        self.with_element(id, |e| e.label = label);
    }

    #[must_use]
    pub fn attrs(&self, id: NodeId) -> Option<&Attrs> {
        self.element(id).map(|e| &e.attrs)
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(key))
    }

    #[must_use]
    pub fn has_attrs(&self, id: NodeId) -> bool {
        self.attrs(id).is_some_and(|a| !a.is_empty())
    }

    pub fn set_attrs(&mut self, id: NodeId, attrs: Attrs) {
        self.with_element(id, |e| e.attrs = attrs);
    }

    pub fn clear_attrs(&mut self, id: NodeId) {
        self.with_element(id, |e| e.attrs.clear());
    }

    #[must_use]
    pub fn text_of(&self, id: NodeId) -> Option<&str> {
        self.tree.get(id).and_then(|n| n.value().as_text())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|p| p.id())
    }

    /// Whether `id` is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root();
        match self.tree.get(id) {
            Some(node) => id == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// All direct children, text included.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|n| {
                n.children()
                    .filter(|c| c.value().as_element().is_some())
                    .map(|c| c.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Element descendants of `id` in document order, `id` excluded.
    #[must_use]
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|n| {
                n.descendants()
                    .skip(1)
                    .filter(|d| d.value().as_element().is_some())
                    .map(|d| d.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Element descendants of `id` in document order, without entering the
    /// subtree of any node for which `prune` holds (the node itself is kept).
    #[must_use]
    pub fn descendant_elements_pruned(
        &self,
        id: NodeId,
        prune: impl Fn(&Self, NodeId) -> bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.element_children(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if !prune(self, current) {
                stack.extend(self.element_children(current).into_iter().rev());
            }
        }
        out
    }

    /// Element descendants of `scope` whose kind is in `kinds`, in document order.
    #[must_use]
    pub fn find_all(&self, scope: NodeId, kinds: KindSet) -> Vec<NodeId> {
        self.descendant_elements(scope)
            .into_iter()
            .filter(|d| self.is_any(*d, kinds))
            .collect()
    }

    #[must_use]
    pub fn find_kind(&self, scope: NodeId, kind: Kind) -> Vec<NodeId> {
        self.find_all(scope, KindSet::of(&[kind]))
    }

    /// Direct element children of `id` whose kind is `kind`.
    #[must_use]
    pub fn children_of_kind(&self, id: NodeId, kind: Kind) -> Vec<NodeId> {
        self.element_children(id)
            .into_iter()
            .filter(|c| self.is_kind(*c, kind))
            .collect()
    }

    // ========================================================================
    // Building
    // ========================================================================

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.node_mut(parent).append(DocNode::Element(element)).id()
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.node_mut(parent).append(DocNode::Text(text.to_string())).id()
    }

    /// Move an existing node (with its subtree) to the end of `parent`.
    pub fn move_to(&mut self, id: NodeId, parent: NodeId) {
        if id != parent {
            self.node_mut(parent).append_id(id);
        }
    }

    // ========================================================================
    // Re-linking
    // ========================================================================

    /// Replace `id` with its children.
    pub fn unwrap(&mut self, id: NodeId) {
        if id == self.root() || self.parent(id).is_none() {
            return;
        }
        let children = self.children(id);
        let mut node = self.node_mut(id);
        for child in children {
            node.insert_id_before(child);
        }
        node.detach();
    }

    /// Remove `id` and its whole subtree from the document.
    pub fn decompose(&mut self, id: NodeId) {
        if id != self.root() {
            self.node_mut(id).detach();
        }
    }

    /// Insert a new element in the place of `id` and move `id` into it.
    pub fn wrap(&mut self, id: NodeId, wrapper: Element) -> Option<NodeId> {
        self.parent(id)?;
        let wrapper = self.node_mut(id).insert_before(DocNode::Element(wrapper)).id();
        self.node_mut(wrapper).append_id(id);
        Some(wrapper)
    }

    /// Wrap a run of siblings into one new element placed where the run starts.
    pub fn wrap_run(&mut self, run: &[NodeId], wrapper: Element) -> Option<NodeId> {
        let first = *run.first()?;
        let wrapper = self.wrap(first, wrapper)?;
        for id in &run[1..] {
            self.node_mut(wrapper).append_id(*id);
        }
        Some(wrapper)
    }

    /// Unwrap every element of `kinds` below `scope`.
    pub fn unwrap_all(&mut self, scope: NodeId, kinds: KindSet) {
        for id in self.find_all(scope, kinds) {
            if self.is_attached(id) {
                self.unwrap(id);
            }
        }
    }

    /// Decompose every element of `kinds` below `scope`.
    pub fn decompose_all(&mut self, scope: NodeId, kinds: KindSet) {
        for id in self.find_all(scope, kinds) {
            self.decompose(id);
        }
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Concatenated text of the subtree.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            for d in node.descendants() {
                if let Some(text) = d.value().as_text() {
                    out.push_str(text);
                }
            }
        }
        out
    }

    /// Text nodes of the subtree in document order.
    pub fn text_runs(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.tree
            .get(id)
            .into_iter()
            .flat_map(|n| n.descendants())
            .filter_map(|d| d.value().as_text())
    }

    /// Number of non-whitespace characters in the subtree.
    #[must_use]
    pub fn real_text_length(&self, id: NodeId) -> usize {
        self.tree
            .get(id)
            .map(|n| {
                n.descendants()
                    .filter_map(|d| d.value().as_text())
                    .map(|t| t.chars().filter(|c| !c.is_whitespace()).count())
                    .sum()
            })
            .unwrap_or(0)
    }

    #[must_use]
    pub fn has_text(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some_and(|n| {
            n.descendants()
                .filter_map(|d| d.value().as_text())
                .any(|t| !t.trim().is_empty())
        })
    }

    /// Words in the text nodes directly under `id`.
    #[must_use]
    pub fn immediate_words(&self, id: NodeId) -> usize {
        self.tree
            .get(id)
            .map(|n| {
                n.children()
                    .filter_map(|c| c.value().as_text())
                    .map(|t| t.split_whitespace().count())
                    .sum()
            })
            .unwrap_or(0)
    }

    // ========================================================================
    // Debug rendering
    // ========================================================================

    /// Compact s-expression of the subtree, used to compare trees in tests.
    #[must_use]
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            render_node(node, &mut out);
        }
        out
    }
}

fn render_node(node: NodeRef<'_, DocNode>, out: &mut String) {
    match node.value() {
        DocNode::Text(text) => {
            let _ = write!(out, "{text:?}");
        }
        DocNode::Root | DocNode::Element(_) => {
            let name = match node.value() {
                DocNode::Element(e) => e.label.as_str(),
                _ => "root",
            };
            out.push('(');
            out.push_str(name);
            if let DocNode::Element(e) = node.value() {
                for (k, v) in &e.attrs {
                    let _ = write!(out, " @{k}={v:?}");
                }
            }
            for child in node.children() {
                out.push(' ');
                render_node(child, out);
            }
            out.push(')');
        }
    }
}
