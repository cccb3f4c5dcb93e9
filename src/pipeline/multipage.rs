//! Metadata of articles split over several pages

use super::source::{ArticleMeta, Page};

fn union_into(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

/// Combine the metadata of every page.
///
/// Scalar fields come from the first page that has them; lists are unioned
/// in page order. The publication date is the earliest one seen, the
/// modification date the latest modification, or the latest publication
/// date when no page reports a modification.
#[must_use]
pub fn merge_meta(pages: &[Page]) -> ArticleMeta {
    let mut merged = ArticleMeta::default();
    for meta in pages.iter().map(|page| &page.meta) {
        if merged.title.is_none() {
            merged.title.clone_from(&meta.title);
        }
        if merged.alternate_title.is_none() {
            merged.alternate_title.clone_from(&meta.alternate_title);
        }
        if merged.section.is_none() {
            merged.section.clone_from(&meta.section);
        }
        union_into(&mut merged.authors, &meta.authors);
        union_into(&mut merged.keywords, &meta.keywords);
        union_into(&mut merged.sources, &meta.sources);
        for (key, value) in &meta.extra {
            merged.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    let metas = || pages.iter().map(|page| &page.meta);
    merged.published = metas().filter_map(|m| m.published).min();
    merged.modified = metas()
        .filter_map(|m| m.modified)
        .max()
        .or_else(|| metas().filter_map(|m| m.published).max());
    merged
}
