//! Paragraph levels and the emphasis/paragraph hierarchy

use ego_tree::NodeId;
use tracing::debug;

use crate::tree::kind::{FIGURES, INLINE, KindSet, PARAGRAPH_AND_INLINE, PARAGRAPH_LIKE};
use crate::tree::{DocTree, Element, Kind, Shape};

/// The only paragraph below `id` when everything below it is paragraph or inline.
fn lone_inner_paragraph(doc: &DocTree, id: NodeId, shape: &Shape) -> Option<NodeId> {
    let descendants = shape.descendants;
    let proper_subset = descendants.is_subset(PARAGRAPH_AND_INLINE) && descendants != PARAGRAPH_AND_INLINE;
    if !descendants.contains(Kind::Paragraph) || !proper_subset || shape.foreign_children {
        return None;
    }
    match doc.find_kind(id, Kind::Paragraph).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Collapse paragraph levels that the output grammar cannot nest.
pub fn deal_with_paragraphs(doc: &mut DocTree, url: &str) {
    debug!(url, "dealing with paragraphs");
    let root = doc.root();

    for p in doc.find_kind(root, Kind::Paragraph) {
        if !doc.is_attached(p) {
            continue;
        }
        let shape = Shape::of(doc, p);
        if shape.children.intersects(PARAGRAPH_LIKE)
            || (!shape.naked_text && !shape.children.intersects(INLINE))
        {
            doc.unwrap(p);
        } else if !shape.naked_text
            && let Some(inner) = lone_inner_paragraph(doc, p, &shape)
        {
            doc.set_label(inner, Kind::ToUnwrap);
        }
    }

    for p_like in doc.find_all(root, PARAGRAPH_LIKE) {
        if !doc.is_attached(p_like) {
            continue;
        }
        let shape = Shape::of(doc, p_like);
        if let Some(inner) = lone_inner_paragraph(doc, p_like, &shape) {
            doc.set_label(inner, Kind::ToUnwrap);
        }
    }
}

/// Children an inline element may keep; anything else is structure.
const STAYS_UNDER_INLINE: KindSet = INLINE.union(FIGURES).union(KindSet::of(&[Kind::Note]));

fn wraps_structure(doc: &DocTree, id: NodeId) -> bool {
    doc.element_children(id)
        .into_iter()
        .any(|child| !doc.is_any(child, STAYS_UNDER_INLINE))
}

/// Push formatting and links below the structure they wrap, innermost first.
///
/// `(bold (paragraph "x"))` becomes `(paragraph (bold "x"))`. Runs of own
/// text and inline children keep a copy of the wrapper; every structural
/// child gets a copy around its own children. A copy that still wraps
/// structure is pushed further down, so formatting ends up directly above
/// inline content.
pub fn fix_formatting_hierarchy(doc: &mut DocTree, url: &str) {
    debug!(url, "fixing formatting hierarchy");
    let mut pending = doc.find_all(doc.root(), INLINE);
    while let Some(wrapper) = pending.pop() {
        if doc.is_attached(wrapper) && wraps_structure(doc, wrapper) {
            pending.extend(push_below_structure(doc, wrapper));
        }
    }
}

/// Distribute `wrapper` over its children and drop it; returns the copies
/// that still wrap structure.
fn push_below_structure(doc: &mut DocTree, wrapper: NodeId) -> Vec<NodeId> {
    let Some(template) = doc.element(wrapper).cloned() else {
        return Vec::new();
    };
    let mut copies = Vec::new();
    let mut run = Vec::new();
    for child in doc.children(wrapper) {
        if doc.element(child).is_none() || doc.is_any(child, STAYS_UNDER_INLINE) {
            run.push(child);
            continue;
        }
        wrap_formatted_run(doc, &mut run, &template);
        let inner = doc.children(child);
        if let Some(copy) = doc.wrap_run(&inner, template.clone()) {
            copies.push(copy);
        }
    }
    wrap_formatted_run(doc, &mut run, &template);
    doc.unwrap(wrapper);
    copies.retain(|copy| wraps_structure(doc, *copy));
    copies
}

fn wrap_formatted_run(doc: &mut DocTree, run: &mut Vec<NodeId>, template: &Element) {
    let blank = run
        .iter()
        .all(|id| doc.text_of(*id).is_some_and(|text| text.trim().is_empty()));
    if !blank {
        doc.wrap_run(run, template.clone());
    }
    run.clear();
}
