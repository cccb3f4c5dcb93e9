//! Redundant levels inherited from HTML

use tracing::debug;

use crate::tree::kind::{BLOCKS, HIGHLIGHT, KindSet, PARAGRAPH_LIKE};
use crate::tree::{DocTree, Kind, Shape};

/// Remove duplicated wrappers and double formatting, and flatten paragraphs in links.
///
/// A non-block element whose only child kind is its own kind is a duplicated
/// level: without own text it is unwrapped, with own text and an emphasis
/// kind its inner copies are. Emphasis repeated anywhere below itself is
/// flattened the same way.
pub fn remove_unnecessary_wrappers(doc: &mut DocTree, url: &str) {
    debug!(url, "removing unnecessary wrappers");
    let root = doc.root();

    for id in doc.descendant_elements(root) {
        if !doc.is_attached(id) || doc.is_any(id, BLOCKS) {
            continue;
        }
        let Some(kind) = doc.kind(id) else {
            continue;
        };
        let shape = Shape::of(doc, id);
        let own = KindSet::of(&[kind]);
        if shape.foreign_children || shape.children != own {
            continue;
        }
        if !shape.naked_text {
            doc.unwrap(id);
        } else if HIGHLIGHT.contains(kind) {
            doc.unwrap_all(id, own);
        }
    }

    for id in doc.find_all(root, HIGHLIGHT) {
        if !doc.is_attached(id) {
            continue;
        }
        let Some(kind) = doc.kind(id) else {
            continue;
        };
        if Shape::of(doc, id).descendants.contains(kind) {
            doc.unwrap_all(id, KindSet::of(&[kind]));
        }
    }

    for reference in doc.find_kind(root, Kind::Reference) {
        if doc.is_attached(reference) {
            doc.unwrap_all(reference, PARAGRAPH_LIKE);
        }
    }
}
