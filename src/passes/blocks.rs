//! Block-specific renaming, nesting curation and inner structure

use tracing::{debug, warn};

use super::wrapping::complex_wrap;
use crate::rules::BlockRules;
use crate::tree::kind::{BLOCKS, INLINE};
use crate::tree::{DocTree, Element, Kind};

/// Apply each block's rename map to its own descendants, innermost block first.
///
/// The walk enters neither a nested block root's subtree nor crosses it;
/// the nested root itself may still be renamed. Headings then lose every
/// non-inline descendant.
pub fn block_specific_renaming(doc: &mut DocTree, rules: &BlockRules, url: &str) {
    debug!(url, "block specific renaming");
    for block in doc.find_all(doc.root(), BLOCKS).into_iter().rev() {
        let Some(rule) = doc.kind(block).and_then(|kind| rules.get(kind)) else {
            continue;
        };
        if rule.rename.is_empty() {
            continue;
        }
        let scope = doc.descendant_elements_pruned(block, |d, id| d.is_any(id, BLOCKS));
        for desc in scope {
            let renamed = doc.label(desc).and_then(|label| rule.renamed(label)).cloned();
            if let Some(label) = renamed {
                doc.set_label(desc, label);
            }
        }
    }

    for heading in doc.find_kind(doc.root(), Kind::Heading) {
        for desc in doc.descendant_elements(heading) {
            if !doc.is_any(desc, INLINE) {
                doc.unwrap(desc);
            }
        }
    }
}

/// Resolve blocks nested in blocks.
///
/// A same-kind descendant with the same text is a duplicated level and is
/// unwrapped. Otherwise a descendant the outer block forbids inside it is
/// unwrapped, and an outer block that may not contain the descendant is
/// marked for unwrapping.
pub fn block_specific_curation(doc: &mut DocTree, rules: &BlockRules, url: &str) {
    debug!(url, "curating nested blocks");
    for block in doc.find_all(doc.root(), BLOCKS) {
        if !doc.is_attached(block) {
            continue;
        }
        let Some(kind) = doc.kind(block) else {
            continue;
        };
        let Some(rule) = rules.get(kind) else {
            continue;
        };
        let text = doc.text(block);
        let text = text.trim();

        for inner in doc.find_all(block, BLOCKS) {
            if !doc.is_attached(inner) {
                continue;
            }
            let Some(inner_kind) = doc.kind(inner) else {
                continue;
            };
            if inner_kind == kind && doc.text(inner).trim() == text {
                doc.unwrap(inner);
            } else if rule.forbidden_inner.contains(inner_kind) {
                debug!(url, outer = %kind, inner = %inner_kind, "invalid inner block unwrapped");
                doc.unwrap(inner);
            } else if rule.forbidden_outer.contains(inner_kind) {
                debug!(url, outer = %kind, inner = %inner_kind, "invalid outer block dropped");
                doc.set_label(block, Kind::ToUnwrap);
            }
        }
    }
}

/// Wrap stray content of every block into its default child; lists get items.
pub fn block_structure(doc: &mut DocTree, rules: &BlockRules, url: &str) {
    debug!(url, "block structure");
    for block in doc.find_all(doc.root(), BLOCKS) {
        if !doc.is_attached(block) {
            continue;
        }
        let Some(kind) = doc.kind(block) else {
            continue;
        };
        match rules.get(kind) {
            Some(rule) => complex_wrap(doc, block, rule.default_child),
            None => warn!(url, block = %kind, "no block rule, structure left as is"),
        }
    }

    for list in doc.find_kind(doc.root(), Kind::List) {
        for child in doc.children(list) {
            let wrap = match doc.text_of(child) {
                Some(text) => !text.trim().is_empty(),
                None => !doc.is_kind(child, Kind::ListItem),
            };
            if wrap {
                doc.wrap(child, Element::new(Kind::ListItem));
            }
        }
    }
}
