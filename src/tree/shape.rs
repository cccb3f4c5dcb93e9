//! Shape summary of a node: own text, child kinds, descendant kinds
//!
//! Most structural decisions only need to know whether a node has naked
//! text and which kinds occur one level down or anywhere below it.

use ego_tree::NodeId;

use super::doc::DocTree;
use super::kind::KindSet;
use super::node::Label;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shape {
    /// At least one word of text directly under the node
    pub naked_text: bool,
    pub children: KindSet,
    pub descendants: KindSet,
    /// Some child element has a non-canonical label
    pub foreign_children: bool,
}

impl Shape {
    #[must_use]
    pub fn of(doc: &DocTree, id: NodeId) -> Self {
        let mut shape = Shape {
            naked_text: doc.immediate_words(id) > 0,
            ..Shape::default()
        };
        for child in doc.element_children(id) {
            match doc.label(child) {
                Some(Label::Kind(kind)) => shape.children.insert(*kind),
                Some(_) => shape.foreign_children = true,
                None => {}
            }
        }
        for desc in doc.descendant_elements(id) {
            if let Some(kind) = doc.kind(desc) {
                shape.descendants.insert(kind);
            }
        }
        shape
    }

    /// Only inline kinds (or nothing) one level down.
    #[must_use]
    pub fn children_inline_only(&self) -> bool {
        !self.foreign_children && self.children.is_subset(crate::tree::kind::INLINE)
    }
}
