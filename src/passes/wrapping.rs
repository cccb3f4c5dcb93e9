//! Wrapping primitives shared by the structural passes

use ego_tree::NodeId;

use crate::tree::kind::{INLINE, Kind, MEDIA_ROOTS};
use crate::tree::{DocTree, Element, Shape};

/// Put stray text and inline runs directly under `root` into `default` wrappers.
///
/// A root whose children are all inline is itself pushed one level down: a
/// new element with the root's label is inserted above it and the root is
/// relabelled to `default`. Media roots are never relabelled; their runs are
/// wrapped instead. Otherwise each maximal run of non-blank text and inline
/// elements is wrapped, left to right, and blank text between other
/// children is dropped.
pub fn complex_wrap(doc: &mut DocTree, root: NodeId, default: Kind) {
    let shape = Shape::of(doc, root);
    let is_media = doc.is_any(root, MEDIA_ROOTS);

    if shape.children_inline_only() && !is_media {
        let Some(label) = doc.label(root).cloned() else {
            return;
        };
        if doc.wrap(root, Element::new(label)).is_some() {
            doc.set_label(root, default);
        }
        return;
    }

    let has_inline_child = shape.children.intersects(INLINE);
    if !(shape.naked_text || has_inline_child || (shape.children_inline_only() && is_media)) {
        return;
    }

    let mut run: Vec<NodeId> = Vec::new();
    for child in doc.children(root) {
        let blank = doc.text_of(child).map(|text| text.trim().is_empty());
        match blank {
            Some(true) => {
                if run.is_empty() {
                    doc.decompose(child);
                } else {
                    run.push(child);
                }
            }
            Some(false) => run.push(child),
            None if doc.is_any(child, INLINE) => run.push(child),
            None => {
                flush(doc, &mut run, default);
            }
        }
    }
    flush(doc, &mut run, default);
}

fn flush(doc: &mut DocTree, run: &mut Vec<NodeId>, default: Kind) {
    if !run.is_empty() {
        doc.wrap_run(run, Element::new(default));
        run.clear();
    }
}

/// Group runs of `member` elements that lack a `container` parent.
///
/// Scans the element children of `scope` (all descendants when `recursive`)
/// in document order; consecutive members share one new container inserted
/// where the run starts, and any other element ends the run.
pub fn missing_root_replacement(
    doc: &mut DocTree,
    scope: NodeId,
    member: Kind,
    container: Kind,
    recursive: bool,
) {
    let candidates = if recursive {
        doc.descendant_elements(scope)
    } else {
        doc.element_children(scope)
    };

    let mut current: Option<NodeId> = None;
    for id in candidates {
        if !doc.is_attached(id) {
            continue;
        }
        if doc.is_kind(id, member) {
            let parent_is_container = doc
                .parent(id)
                .is_some_and(|parent| doc.is_kind(parent, container));
            if parent_is_container {
                continue;
            }
            match current {
                Some(wrapper) if doc.parent(id) == doc.parent(wrapper) => doc.move_to(id, wrapper),
                _ => current = doc.wrap(id, Element::new(container)),
            }
        } else {
            current = None;
        }
    }
}
