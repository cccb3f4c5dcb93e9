//! The rewrite engine: one article body in, TEI body contents out

use tracing::{debug, info};

use crate::config::CompiledPortal;
use crate::normalize::normalize;
use crate::passes::{
    block_specific_curation, block_specific_renaming, block_structure, clean_leftovers,
    correct_table_structure, deal_with_paragraphs, demote_misplaced_leads,
    disambiguate_table_or_frame, fix_formatting_hierarchy, handle_media, missing_root_replacement,
    remove_empty_media, remove_unnecessary_wrappers, rename_by_bigram_rules, resolve_sections,
    wrap_media_text,
};
use crate::tei::{ConvertedBody, XmlNode, convert_body};
use crate::tree::{DocTree, Kind, KindSet, import_article};

const TO_UNWRAP: KindSet = KindSet::of(&[Kind::ToUnwrap]);
const TO_DECOMPOSE: KindSet = KindSet::of(&[Kind::ToDecompose]);

/// Result of converting one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// Body contents for the TEI `body`
    Converted(Vec<XmlNode>),
    /// The body held no text after rewriting
    Empty,
    /// None of the portal's article-root selectors matched
    RootNotFound,
}

impl ArticleOutcome {
    /// The converted body, if a root was found.
    #[must_use]
    pub fn into_body(self) -> Option<ConvertedBody> {
        match self {
            ArticleOutcome::Converted(contents) => Some(ConvertedBody::Contents(contents)),
            ArticleOutcome::Empty => Some(ConvertedBody::Empty),
            ArticleOutcome::RootNotFound => None,
        }
    }
}

/// Runs the rewrite passes for one portal. Holds no per-article state and
/// can be shared between worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'p> {
    portal: &'p CompiledPortal,
}

impl<'p> Engine<'p> {
    #[must_use]
    pub fn new(portal: &'p CompiledPortal) -> Self {
        Self { portal }
    }

    #[must_use]
    pub fn portal(&self) -> &'p CompiledPortal {
        self.portal
    }

    /// Select, import, rewrite and convert the article body of `html`.
    #[must_use]
    pub fn convert_html(&self, html: &str, url: &str) -> ArticleOutcome {
        let Some(imported) = import_article(html, self.portal, url) else {
            return ArticleOutcome::RootNotFound;
        };
        if imported.salvaged {
            info!(url, "converting salvaged plain text");
        }
        let mut doc = imported.doc;
        self.rewrite(&mut doc, url);
        match convert_body(&doc, url) {
            ConvertedBody::Contents(contents) => ArticleOutcome::Converted(contents),
            ConvertedBody::Empty => ArticleOutcome::Empty,
        }
    }

    /// Run every pass, in order, over an imported body.
    pub fn rewrite(&self, doc: &mut DocTree, url: &str) {
        let root = doc.root();
        let portal = self.portal;
        debug!(url, "rewriting article");

        normalize(doc, portal, url);
        resolve_sections(doc);
        doc.decompose_all(root, TO_DECOMPOSE);
        doc.unwrap_all(root, TO_UNWRAP);

        rename_by_bigram_rules(doc, &portal.bigram_rules, url);
        disambiguate_table_or_frame(doc, url);
        block_specific_renaming(doc, &portal.block_rules, url);
        doc.decompose_all(root, TO_DECOMPOSE);
        doc.unwrap_all(root, TO_UNWRAP);

        handle_media(doc, url);
        clean_leftovers(doc, url);
        demote_misplaced_leads(doc, url);
        remove_unnecessary_wrappers(doc, url);
        doc.unwrap_all(root, TO_UNWRAP);

        deal_with_paragraphs(doc, url);
        fix_formatting_hierarchy(doc, url);
        block_specific_curation(doc, &portal.block_rules, url);
        correct_table_structure(doc, url);
        deal_with_paragraphs(doc, url);
        block_structure(doc, &portal.block_rules, url);
        doc.unwrap_all(root, TO_UNWRAP);

        remove_unnecessary_wrappers(doc, url);
        remove_empty_media(doc, url);
        wrap_media_text(doc);
        deal_with_paragraphs(doc, url);
        doc.unwrap_all(root, TO_UNWRAP);

        missing_root_replacement(doc, root, Kind::Comment, Kind::CommentRoot, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{dictionary, portal_config, portal_with_dictionary};
    use crate::tei::XmlElement;

    const ROWS: &[(&str, &str, &str)] = &[
        ("<div class=x>", "box", "default"),
        ("<b>", "bold", "default"),
        ("<p>", "paragraph", "default"),
        ("<table>", "table", "default"),
        ("<tr>", "row", "default"),
        ("<td>", "column", "default"),
        ("<span>", "unwrap", "default"),
        ("<script>", "decompose", "default"),
    ];

    #[test]
    fn test_missing_root() {
        let mut config = portal_config();
        config.article_roots = vec!["article".into()];
        let portal = config
            .compile_with_dictionary(dictionary(ROWS))
            .expect("portal compiles");
        let engine = Engine::new(&portal);
        assert_eq!(engine.convert_html("<div>nothing</div>", "u"), ArticleOutcome::RootNotFound);
    }

    #[test]
    fn test_whitespace_only_body_is_empty() {
        let portal = portal_with_dictionary(ROWS);
        let engine = Engine::new(&portal);
        let outcome = engine.convert_html("<article> <span> </span> <script>x()</script></article>", "u");
        assert_eq!(outcome, ArticleOutcome::Empty);
        assert_eq!(outcome.into_body(), Some(ConvertedBody::Empty));
    }

    #[test]
    fn test_plain_paragraphs() {
        let portal = portal_with_dictionary(ROWS);
        let engine = Engine::new(&portal);
        let outcome = engine.convert_html(
            "<article><p>Első <b>bekezdés</b>.</p><p>Második</p></article>",
            "u",
        );
        let ArticleOutcome::Converted(contents) = outcome else {
            panic!("expected a converted body");
        };
        let paragraphs: Vec<&XmlElement> = contents.iter().filter_map(XmlNode::as_element).collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "Első bekezdés.");
        assert_eq!(
            paragraphs[0].element_children().next().and_then(|hi| hi.attr("rend")),
            Some("bold")
        );
    }
}
