//! Section resolution, leftover cleaning and the lead position check

use tracing::debug;

use crate::tree::kind::{BUILTIN, TEXTLESS_ALLOWED};
use crate::tree::{DocTree, Kind, Label};

/// Characters of a lead used to locate it in the article text.
const LEAD_OPENING_CHARS: usize = 20;

/// Offset (in characters) beyond which a lead is not at the start.
const LEAD_MAX_OFFSET: usize = 5;

/// Sections with own words become paragraphs; the rest are dissolved.
pub fn resolve_sections(doc: &mut DocTree) {
    for section in doc.find_kind(doc.root(), Kind::Section) {
        if !doc.is_attached(section) {
            continue;
        }
        if doc.immediate_words(section) > 0 {
            doc.set_label(section, Kind::Paragraph);
        } else {
            doc.unwrap(section);
        }
    }
}

/// Drop textless helper levels and mark anything non-canonical for unwrapping.
pub fn clean_leftovers(doc: &mut DocTree, url: &str) {
    debug!(url, "cleaning textless and temporary tags");
    for id in doc.descendant_elements(doc.root()) {
        if !doc.is_attached(id) {
            continue;
        }
        let textless_ok = doc.is_any(id, TEXTLESS_ALLOWED);
        if !textless_ok && !doc.has_text(id) {
            doc.unwrap(id);
            continue;
        }
        let builtin = matches!(doc.label(id), Some(Label::Kind(kind)) if BUILTIN.contains(*kind));
        if !builtin {
            doc.set_label(id, Kind::ToUnwrap);
        }
    }
}

/// A lead that is not the first one and does not open the article is a paragraph.
pub fn demote_misplaced_leads(doc: &mut DocTree, url: &str) {
    let article_text = doc.text(doc.root());
    for (i, lead) in doc.find_kind(doc.root(), Kind::Lead).into_iter().enumerate() {
        if i == 0 {
            continue;
        }
        let lead_text = doc.text(lead);
        let opening: String = lead_text.chars().take(LEAD_OPENING_CHARS).collect();
        let offset = article_text
            .find(&opening)
            .map(|byte| article_text[..byte].chars().count());
        if offset.is_some_and(|chars| chars > LEAD_MAX_OFFSET) {
            debug!(url, lead = %opening, "lead is not at the beginning of the article");
            doc.set_label(lead, Kind::Paragraph);
        }
    }
}
