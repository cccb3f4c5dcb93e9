//! Media roots, galleries and their inner references

use ego_tree::NodeId;
use tracing::debug;

use super::wrapping::complex_wrap;
use crate::tree::kind::{FIGURES, INLINE, KindSet, MEDIA_ROOTS, TEXTLESS_ALLOWED};
use crate::tree::{Attrs, DocTree, Kind};

const EMPTY_DROPPABLE: KindSet =
    KindSet::of(&[Kind::SocialMedia, Kind::Figure, Kind::EmbeddedContent]);

fn keeps_inside(doc: &DocTree, media: Kind, inner: NodeId) -> bool {
    doc.kind(inner)
        .is_some_and(|k| media.media_children().contains(k) || INLINE.contains(k))
}

/// Settle media roots, their links and galleries.
pub fn handle_media(doc: &mut DocTree, url: &str) {
    debug!(url, "handling media blocks");
    let root = doc.root();

    for child in doc.children_of_kind(root, Kind::MediaReference) {
        doc.set_label(child, Kind::MediaContent);
    }

    for media in doc.find_all(root, MEDIA_ROOTS).into_iter().rev() {
        if !doc.is_attached(media) {
            continue;
        }
        let Some(kind) = doc.kind(media) else {
            continue;
        };
        if doc.attr(media, "target").is_some() || kind == Kind::SocialMedia {
            for inner in doc.descendant_elements(media) {
                if doc.is_kind(inner, Kind::MediaReference) {
                    doc.set_label(inner, Kind::Reference);
                } else if !keeps_inside(doc, kind, inner) {
                    doc.unwrap(inner);
                }
            }
            continue;
        }

        let targeted: Vec<NodeId> = doc
            .find_kind(media, Kind::MediaReference)
            .into_iter()
            .filter(|r| doc.attr(*r, "target").is_some())
            .collect();
        match targeted.as_slice() {
            [] => {}
            [single] => {
                let attrs: Attrs = doc.attrs(*single).cloned().unwrap_or_default();
                doc.set_attrs(media, attrs);
                doc.unwrap(*single);
            }
            _ => {
                for reference in doc.find_kind(media, Kind::MediaReference) {
                    doc.set_label(reference, Kind::MediaContent);
                }
                doc.set_label(media, Kind::Gallery);
            }
        }
    }

    for caption in doc.find_all(root, FIGURES) {
        if doc.is_attached(caption)
            && !doc.has_attrs(caption)
            && !doc.find_all(caption, FIGURES).is_empty()
        {
            doc.unwrap(caption);
        }
    }

    for media in doc.find_all(root, MEDIA_ROOTS) {
        if !doc.is_attached(media) {
            continue;
        }
        let Some(kind) = doc.kind(media) else {
            continue;
        };
        for inner in doc.descendant_elements(media) {
            if doc.is_any(inner, MEDIA_ROOTS) {
                if doc.has_attrs(media) {
                    debug!(url, "media element inside media element");
                } else {
                    doc.unwrap(media);
                    break;
                }
            } else if !keeps_inside(doc, kind, inner) {
                doc.unwrap(inner);
            }
        }
    }

    for reference in doc.find_kind(root, Kind::MediaReference) {
        doc.set_label(reference, Kind::MediaContent);
    }
}

/// Delete media shells that carry neither text nor a link.
///
/// Ancestors left without text or media by a deletion go with it.
pub fn remove_empty_media(doc: &mut DocTree, url: &str) {
    let root = doc.root();

    for figure in doc.find_kind(root, Kind::MediaContent) {
        if doc.is_attached(figure) && !doc.has_text(figure) && !doc.has_attrs(figure) {
            decompose_with_hollow_ancestors(doc, figure, url);
        }
    }

    for gallery in doc.find_kind(root, Kind::Gallery) {
        if !doc.is_attached(gallery) || !doc.find_kind(gallery, Kind::MediaContent).is_empty() {
            continue;
        }
        if doc.real_text_length(gallery) > 0 {
            debug!(url, "gallery with caption but without any figure");
        }
        decompose_with_hollow_ancestors(doc, gallery, url);
    }

    for media in doc.find_all(root, EMPTY_DROPPABLE) {
        if !doc.is_attached(media) {
            continue;
        }
        let linked = doc.attr(media, "target").is_some()
            || doc
                .descendant_elements(media)
                .into_iter()
                .any(|d| doc.attr(d, "target").is_some());
        if doc.real_text_length(media) == 0 && !linked {
            debug!(url, "empty social media content or figure removed");
            decompose_with_hollow_ancestors(doc, media, url);
        }
    }
}

fn decompose_with_hollow_ancestors(doc: &mut DocTree, id: NodeId, url: &str) {
    let root = doc.root();
    let mut parent = doc.parent(id);
    doc.decompose(id);
    while let Some(ancestor) = parent.filter(|p| *p != root) {
        if doc.has_text(ancestor) || !doc.find_all(ancestor, TEXTLESS_ALLOWED).is_empty() {
            break;
        }
        debug!(url, kind = ?doc.kind(ancestor), "element emptied by media removal dropped");
        parent = doc.parent(ancestor);
        doc.decompose(ancestor);
    }
}

/// Wrap stray text inside media roots into paragraphs.
pub fn wrap_media_text(doc: &mut DocTree) {
    for media in doc.find_all(doc.root(), MEDIA_ROOTS) {
        if doc.is_attached(media) {
            complex_wrap(doc, media, Kind::Paragraph);
        }
    }
}
