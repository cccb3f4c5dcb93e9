//! Dictionary-driven renaming of imported HTML elements
//!
//! Every element is frozen into a [`TagSignature`], looked up in the portal
//! [`Dictionary`] and renamed to a canonical kind (or a portal-specific
//! intermediate label). Attributes are dropped except for one preserved
//! link target or language code. Link targets go through the link corrector.

pub mod dictionary;
pub mod inventory;
pub mod signature;
pub mod simplify;

use ego_tree::NodeId;
use tracing::{debug, warn};

pub use dictionary::{DictAction, Dictionary, Preserve};
pub use signature::TagSignature;
pub use simplify::{AttributeExclusion, AttributeFilter, ConfiguredExclusions, freeze};

use crate::config::CompiledPortal;
use crate::link_corrector::{LinkContext, LinkOutcome, classify_link};
use crate::tree::kind::{Kind, KindSet, LINK_KINDS, MEDIA_ROOTS, TEXTLESS_ALLOWED};
use crate::tree::node::{Attrs, Element, Label};
use crate::tree::DocTree;

/// Kinds that may stay without text right after renaming.
const TEXTLESS_AFTER_RENAME: KindSet = LINK_KINDS
    .union(MEDIA_ROOTS)
    .union(TEXTLESS_ALLOWED)
    .union(KindSet::of(&[Kind::ToDecompose]));

/// First attribute that looks like a short language code.
#[must_use]
pub fn language_code(attrs: &[(String, String)]) -> Option<&str> {
    attrs
        .iter()
        .find(|(k, v)| k.contains("lang") && v.chars().count() < 6 && !v.contains('-'))
        .map(|(_, v)| v.as_str())
}

/// Signature of an imported element, if `id` is still an HTML element.
#[must_use]
pub fn signature_of(doc: &DocTree, id: NodeId, portal: &CompiledPortal) -> Option<TagSignature> {
    let element = doc.element(id)?;
    let Label::Html(name) = &element.label else {
        return None;
    };
    Some(freeze(
        name,
        &element.attrs,
        portal.attribute_filter.as_ref(),
        &portal.thresholds,
    ))
}

/// Signatures of all elements below the root that the dictionary does not know.
#[must_use]
pub fn missing_signatures(doc: &DocTree, portal: &CompiledPortal) -> Vec<TagSignature> {
    doc.descendant_elements(doc.root())
        .into_iter()
        .filter_map(|id| signature_of(doc, id, portal))
        .filter(|sig| !portal.dictionary.contains(sig))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub renamed: usize,
    pub missing: usize,
}

/// Rename every imported element of `doc` according to the portal dictionary.
pub fn normalize(doc: &mut DocTree, portal: &CompiledPortal, url: &str) -> NormalizeStats {
    debug!(url, "normalizing tag names");
    let mut stats = NormalizeStats::default();

    for id in doc.descendant_elements(doc.root()) {
        let Some(signature) = signature_of(doc, id, portal) else {
            continue;
        };
        let Some(action) = portal.dictionary.lookup(&signature) else {
            warn!(url, signature = %signature, "tag is not in the dictionary, unwrapping");
            doc.set_label(id, Kind::ToUnwrap);
            doc.clear_attrs(id);
            stats.missing += 1;
            continue;
        };
        stats.renamed += 1;

        match action {
            DictAction::Unwrap => {
                doc.set_label(id, Kind::ToUnwrap);
                doc.clear_attrs(id);
            }
            DictAction::Decompose => {
                doc.set_label(id, Kind::ToDecompose);
                doc.clear_attrs(id);
            }
            DictAction::Structural(kind) => {
                doc.set_label(id, *kind);
                doc.clear_attrs(id);
            }
            DictAction::Wrap { inner, outer } => {
                doc.wrap(id, Element::new(outer.clone()));
                doc.set_label(id, inner.clone());
                doc.clear_attrs(id);
            }
            DictAction::Rename { label, preserve } => {
                rename_preserving(doc, id, label, preserve, portal, url);
            }
        }

        let keeps_empty = match doc.label(id) {
            Some(Label::Kind(kind)) => TEXTLESS_AFTER_RENAME.contains(*kind),
            _ => false,
        };
        if !keeps_empty && !doc.has_text(id) {
            doc.set_label(id, Kind::ToUnwrap);
        }
    }
    stats
}

fn rename_preserving(
    doc: &mut DocTree,
    id: NodeId,
    label: &Label,
    preserve: &Preserve,
    portal: &CompiledPortal,
    url: &str,
) {
    let Some(element) = doc.element(id) else {
        return;
    };
    let html_name = element.label.as_str().to_string();
    let original_attrs = element.attrs.clone();
    doc.set_label(id, label.clone());

    let keeps_attrs =
        portal.link_tags.contains(&html_name) || language_code(&original_attrs).is_some();
    if !keeps_attrs || original_attrs.is_empty() {
        doc.clear_attrs(id);
        return;
    }

    let mut kept = Attrs::new();
    match preserve {
        Preserve::Key(key) => {
            match original_attrs.iter().find(|(k, _)| k == key) {
                Some((_, value)) => {
                    let ctx = LinkContext {
                        url_prefix: &portal.url_prefix,
                        reject: portal.link_reject.as_ref(),
                        source_key: key,
                    };
                    match classify_link(value, &ctx) {
                        LinkOutcome::Unchanged(target) => kept.push(("target".into(), target)),
                        LinkOutcome::Corrected { target, original } => {
                            kept.push(("target".into(), target));
                            kept.push(("original".into(), original));
                        }
                        LinkOutcome::Rejected { original } => {
                            debug!(url, link = %original, "unrepairable link kept as original");
                            kept.push(("original".into(), original));
                        }
                    }
                }
                None => {
                    warn!(url, key = %key, tag = %html_name, "preserved attribute key is missing from the tag");
                }
            }
        }
        Preserve::Language => {
            if let Some(lang) = language_code(&original_attrs) {
                kept.push(("xml:lang".into(), lang.to_string()));
            }
        }
    }

    let has_target = kept.iter().any(|(k, _)| k == "target");
    let dead_media = label.is(Kind::MediaReference) && !has_target;
    let had_key = matches!(preserve, Preserve::Key(_)) && !kept.is_empty();
    doc.set_attrs(id, kept);
    if dead_media && had_key {
        doc.set_label(id, Kind::ToUnwrap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::portal_with_dictionary;

    fn build(doc: &mut DocTree, parent: NodeId, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs: Attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        doc.append_element(parent, Element::html(name, attrs))
    }

    #[test]
    fn test_rename_and_link_outcomes() {
        let portal = portal_with_dictionary(&[
            ("<p>", "paragraph", "default"),
            ("<a href=@LINK>", "reference", "href"),
        ]);
        let mut doc = DocTree::new();
        let root = doc.root();
        let p = build(&mut doc, root, "p", &[]);
        let good = build(&mut doc, p, "a", &[("href", "https://index.hu/a/b")]);
        doc.append_text(good, "good");
        let fixed = build(&mut doc, p, "a", &[("href", "/itthon/x")]);
        doc.append_text(fixed, "fixed");
        let bad = build(&mut doc, p, "a", &[("href", "nem link")]);
        doc.append_text(bad, "bad");

        let stats = normalize(&mut doc, &portal, "https://example.hu/a");
        assert_eq!(stats, NormalizeStats { renamed: 4, missing: 0 });
        assert!(doc.is_kind(p, Kind::Paragraph));
        assert_eq!(doc.attr(good, "target"), Some("https://index.hu/a/b"));
        assert_eq!(doc.attr(good, "original"), None);
        assert_eq!(doc.attr(fixed, "target"), Some("https://example.hu/itthon/x"));
        assert_eq!(doc.attr(fixed, "original"), Some("/itthon/x"));
        assert_eq!(doc.attr(bad, "target"), None);
        assert_eq!(doc.attr(bad, "original"), Some("nem link"));
    }

    #[test]
    fn test_missing_signature_and_textless_are_unwrapped() {
        let portal = portal_with_dictionary(&[("<div>", "paragraph", "default")]);
        let mut doc = DocTree::new();
        let root = doc.root();
        let empty = build(&mut doc, root, "div", &[]);
        let unknown = build(&mut doc, root, "blink", &[]);
        doc.append_text(unknown, "text");

        let stats = normalize(&mut doc, &portal, "u");
        assert_eq!(stats.missing, 1);
        assert!(doc.is_kind(empty, Kind::ToUnwrap));
        assert!(doc.is_kind(unknown, Kind::ToUnwrap));
        assert_eq!(
            missing_signatures(&doc, &portal),
            Vec::<TagSignature>::new()
        );
    }

    #[test]
    fn test_wrap_action_and_language() {
        let portal = portal_with_dictionary(&[
            ("<figure>", "media_content;gallery", ""),
            ("<span lang=en>", "italic", "default"),
        ]);
        let mut doc = DocTree::new();
        let root = doc.root();
        let fig = build(&mut doc, root, "figure", &[]);
        let span = build(&mut doc, root, "span", &[("lang", "en")]);
        doc.append_text(span, "hello");

        normalize(&mut doc, &portal, "u");
        let parent = doc.parent(fig).expect("wrapped");
        assert!(doc.is_kind(parent, Kind::Gallery));
        assert!(doc.is_kind(fig, Kind::MediaContent));
        assert_eq!(doc.attr(span, "xml:lang"), Some("en"));
    }

    #[test]
    fn test_media_reference_without_target_is_dropped() {
        let portal = portal_with_dictionary(&[("<img src=@LINK>", "media_reference", "src")]);
        let mut doc = DocTree::new();
        let root = doc.root();
        let img = build(&mut doc, root, "img", &[("src", "kep")]);
        normalize(&mut doc, &portal, "u");
        assert!(doc.is_kind(img, Kind::ToUnwrap));
        assert_eq!(doc.attr(img, "original"), Some("kep"));
    }
}
