//! Import of the selected article body from parsed HTML
//!
//! The first article-root selector that matches is taken as the body. While
//! copying it into a [`DocTree`], subtrees matched by decompose selectors
//! are skipped, descendants of media roots get the media prefix, comments
//! are dropped and `<br>` becomes a space.

use ahash::AHashSet;
use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::doc::DocTree;
use super::node::{Attrs, Element};
use crate::config::CompiledPortal;
use crate::encoding::{needs_salvage, salvage_text};
use crate::utils::MEDIA_DESCENDANT_PREFIX;

/// Elements below this depth are flattened into the text of the deepest kept one.
const MAX_HTML_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct ImportedArticle {
    pub doc: DocTree,
    /// The body had broken unicode escaping and was flattened to text
    pub salvaged: bool,
}

/// First element matched by the portal's article-root selectors, in selector order.
#[must_use]
pub fn select_article_root<'a>(html: &'a Html, portal: &CompiledPortal) -> Option<ElementRef<'a>> {
    portal
        .article_roots
        .iter()
        .find_map(|selector| html.select(selector).next())
}

/// Parse `raw_html` and import its article body, or `None` if no root selector matched.
#[must_use]
pub fn import_article(raw_html: &str, portal: &CompiledPortal, url: &str) -> Option<ImportedArticle> {
    let html = Html::parse_document(raw_html);
    let Some(root) = select_article_root(&html, portal) else {
        warn!(url, "article body root not found");
        return None;
    };

    let mut doc = import_subtree(root, portal, url);

    let root_text: String = root.text().collect();
    let salvaged = needs_salvage(&root_text, &portal.thresholds);
    if salvaged {
        warn!(url, "bad encoding in article body, salvaging plain text");
        let text = salvage_text(doc.text_runs(doc.root()));
        doc = DocTree::new();
        let body = doc.root();
        doc.append_text(body, &text);
    }

    Some(ImportedArticle { doc, salvaged })
}

fn marked_ids(root: ElementRef<'_>, selectors: &[scraper::Selector]) -> AHashSet<NodeId> {
    let mut ids: AHashSet<NodeId> = selectors
        .iter()
        .flat_map(|selector| root.select(selector))
        .map(|element| element.id())
        .collect();
    ids.remove(&root.id());
    ids
}

/// Copy the children of `root` into a fresh document.
#[must_use]
pub fn import_subtree(root: ElementRef<'_>, portal: &CompiledPortal, url: &str) -> DocTree {
    let to_remove = marked_ids(root, &portal.decompose);
    let media_roots = marked_ids(root, &portal.media_roots);

    let mut doc = DocTree::new();
    let mut stack: Vec<(ego_tree::NodeRef<'_, Node>, NodeId, bool, usize)> = root
        .children()
        .rev()
        .map(|child| (child, doc.root(), false, 1))
        .collect();

    while let Some((node, parent, in_media, depth)) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                doc.append_text(parent, text);
            }
            Node::Element(element) => {
                if to_remove.contains(&node.id()) {
                    continue;
                }
                if element.name() == "br" {
                    doc.append_text(parent, " ");
                    continue;
                }
                if depth > MAX_HTML_NESTING_DEPTH {
                    warn!(
                        url,
                        element = element.name(),
                        limit = MAX_HTML_NESTING_DEPTH,
                        "maximum nesting depth exceeded, subtree flattened to text"
                    );
                    let text = flattened_text(node, &to_remove);
                    if !text.is_empty() {
                        doc.append_text(parent, &text);
                    }
                    continue;
                }

                let name = if in_media && !element.name().starts_with(MEDIA_DESCENDANT_PREFIX) {
                    format!("{MEDIA_DESCENDANT_PREFIX}{}", element.name())
                } else {
                    element.name().to_string()
                };
                let attrs: Attrs = element
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                let id = doc.append_element(parent, Element::html(&name, attrs));

                let child_in_media = in_media || media_roots.contains(&node.id());
                stack.extend(
                    node.children()
                        .rev()
                        .map(|child| (child, id, child_in_media, depth + 1)),
                );
            }
            Node::Comment(_) => {}
            _ => debug!(url, "skipping non-content node"),
        }
    }
    doc
}

/// Text of a subtree, leaving out parts marked for removal.
fn flattened_text(node: ego_tree::NodeRef<'_, Node>, to_remove: &AHashSet<NodeId>) -> String {
    let mut out = String::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match current.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) if to_remove.contains(&current.id()) => {}
            Node::Element(element) if element.name() == "br" => out.push(' '),
            Node::Element(_) => stack.extend(current.children().rev()),
            _ => {}
        }
    }
    out
}
