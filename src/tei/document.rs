//! Full TEI document around a converted body
//!
//! The header carries the bibliographic metadata supplied with the page,
//! the persistent identifier and a revision history of the conversion.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use uuid::Uuid;

use super::converter::ConvertedBody;
use super::element::{XmlElement, XmlNode};
use crate::pipeline::source::ArticleMeta;
use crate::utils::{EMPTY_ARTICLE_NOTE, MODIFIED_CHANGE_NOTE};

pub const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";

/// Persistent identifier of an article crawled from `url` at `crawled`.
#[must_use]
pub fn article_pid(url: &str, crawled: &DateTime<FixedOffset>) -> Uuid {
    let name = format!("{url} {}", timestamp(crawled));
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

fn timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Everything the header needs besides the body.
#[derive(Debug, Clone)]
pub struct DocumentHeader<'a> {
    pub pid: Uuid,
    pub url: &'a str,
    pub record_id: &'a str,
    pub crawl_timestamp: DateTime<FixedOffset>,
    pub processed_at: DateTime<FixedOffset>,
    pub publisher: &'a str,
    pub meta: &'a ArticleMeta,
}

/// One page of a multi-page article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBody {
    pub url: String,
    pub record_id: String,
    pub crawl_timestamp: DateTime<FixedOffset>,
    pub body: ConvertedBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBody {
    Single(ConvertedBody),
    Pages(Vec<PageBody>),
}

impl DocumentBody {
    /// No page produced any content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            DocumentBody::Single(body) => body.is_empty(),
            DocumentBody::Pages(pages) => pages.iter().all(|page| page.body.is_empty()),
        }
    }
}

/// Assemble the complete `TEI` element.
#[must_use]
pub fn build_document(header: &DocumentHeader<'_>, body: DocumentBody) -> XmlElement {
    let empty = body.is_empty();
    let pages = match &body {
        DocumentBody::Pages(pages) => Some(multipage_note(pages)),
        DocumentBody::Single(_) => None,
    };

    let tei_header = XmlElement::new("teiHeader")
        .with_child(file_desc(header))
        .with_children(profile_desc(header.meta).map(XmlNode::from))
        .with_child(revision_desc(header, empty, pages));

    XmlElement::new("TEI")
        .with_attr("xmlns", TEI_NAMESPACE)
        .with_child(tei_header)
        .with_child(XmlElement::new("text").with_child(text_body(header, body)))
}

fn file_desc(header: &DocumentHeader<'_>) -> XmlElement {
    let meta = header.meta;

    let mut title_stmt = XmlElement::new("titleStmt")
        .with_child(XmlElement::new("title").with_attr("type", "main").with_text(title_text(meta)));
    if let Some(alternate) = &meta.alternate_title {
        title_stmt.push(XmlElement::new("title").with_attr("type", "sub").with_text(alternate));
    }
    for author in &meta.authors {
        title_stmt.push(person(author));
    }
    for source in &meta.sources {
        title_stmt.push(
            XmlElement::new("respStmt")
                .with_child(XmlElement::new("resp").with_text("source"))
                .with_child(XmlElement::new("orgName").with_text(source)),
        );
    }

    let publication_stmt = XmlElement::new("publicationStmt")
        .with_child(XmlElement::new("publisher").with_text(header.publisher))
        .with_child(
            XmlElement::new("idno")
                .with_attr("type", "PID")
                .with_text(header.pid.to_string()),
        );

    let mut bibl = XmlElement::new("bibl")
        .with_child(XmlElement::new("title").with_attr("type", "main").with_text(title_text(meta)));
    for author in &meta.authors {
        bibl.push(person(author));
    }
    bibl.push(XmlElement::new("publisher").with_text(header.publisher));
    bibl.push(match &meta.published {
        Some(published) => XmlElement::new("date").with_attr("when", timestamp(published)),
        None => XmlElement::new("date").with_attr("when-custom", "unknown"),
    });
    bibl.push(XmlElement::new("ref").with_attr("target", header.url));

    let mut file_desc = XmlElement::new("fileDesc")
        .with_child(title_stmt)
        .with_child(publication_stmt);
    if let Some(notes) = notes_stmt(meta) {
        file_desc.push(notes);
    }
    file_desc.with_child(XmlElement::new("sourceDesc").with_child(bibl))
}

fn title_text(meta: &ArticleMeta) -> &str {
    meta.title.as_deref().unwrap_or("unknown")
}

fn person(name: &str) -> XmlElement {
    XmlElement::new("author").with_child(XmlElement::new("persName").with_text(name))
}

fn notes_stmt(meta: &ArticleMeta) -> Option<XmlElement> {
    let section = meta.section.iter().map(|s| ("section", s.as_str()));
    let extra = meta.extra.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let notes: Vec<XmlNode> = section
        .chain(extra)
        .map(|(kind, text)| XmlElement::new("note").with_attr("type", kind).with_text(text).into())
        .collect();
    (!notes.is_empty()).then(|| XmlElement::new("notesStmt").with_children(notes))
}

fn profile_desc(meta: &ArticleMeta) -> Option<XmlElement> {
    if meta.keywords.is_empty() {
        return None;
    }
    let keywords = XmlElement::new("keywords").with_children(
        meta.keywords
            .iter()
            .map(|k| XmlElement::new("term").with_text(k).into()),
    );
    Some(
        XmlElement::new("profileDesc")
            .with_child(XmlElement::new("textClass").with_child(keywords)),
    )
}

fn multipage_note(pages: &[PageBody]) -> XmlElement {
    XmlElement::new("note")
        .with_attr("type", "multipage")
        .with_children(pages.iter().map(|page| {
            XmlElement::new("note")
                .with_attr("type", "page")
                .with_child(XmlElement::new("ref").with_attr("target", &page.url))
                .with_child(
                    XmlElement::new("idno")
                        .with_attr("type", "record")
                        .with_text(&page.record_id),
                )
                .with_child(XmlElement::new("date").with_attr("when", timestamp(&page.crawl_timestamp)))
                .into()
        }))
}

fn revision_desc(header: &DocumentHeader<'_>, empty: bool, pages: Option<XmlElement>) -> XmlElement {
    let mut conversion = XmlElement::new("change")
        .with_attr("when", timestamp(&header.processed_at))
        .with_attr("source", header.pid.to_string())
        .with_child(
            XmlElement::new("idno")
                .with_attr("type", "record")
                .with_text(header.record_id),
        )
        .with_child(XmlElement::new("date").with_attr("when", timestamp(&header.crawl_timestamp)));
    if empty {
        conversion.push(
            XmlElement::new("note")
                .with_attr("type", "empty")
                .with_text(EMPTY_ARTICLE_NOTE),
        );
    }
    if let Some(pages) = pages {
        conversion.push(pages);
    }

    let mut revisions = XmlElement::new("revisionDesc").with_child(conversion);
    if let Some(modified) = &header.meta.modified {
        revisions.push(
            XmlElement::new("change")
                .with_attr("when", timestamp(modified))
                .with_attr("source", header.url)
                .with_text(MODIFIED_CHANGE_NOTE),
        );
    }
    revisions
}

fn body_contents(body: ConvertedBody) -> Vec<XmlNode> {
    match body {
        ConvertedBody::Contents(contents) => contents,
        ConvertedBody::Empty => vec![XmlElement::new("p").into()],
    }
}

fn text_body(header: &DocumentHeader<'_>, body: DocumentBody) -> XmlElement {
    let mut out = XmlElement::new("body").with_child(
        XmlElement::new("head")
            .with_attr("type", "title")
            .with_text(title_text(header.meta)),
    );
    if let Some(alternate) = &header.meta.alternate_title {
        out.push(
            XmlElement::new("head")
                .with_attr("type", "subtitle")
                .with_text(alternate),
        );
    }

    match body {
        DocumentBody::Single(body) => out.children.extend(body_contents(body)),
        DocumentBody::Pages(pages) => {
            for page in pages {
                out.push(
                    XmlElement::new("div")
                        .with_attr("type", "page")
                        .with_attr("source", &page.url)
                        .with_children(body_contents(page.body)),
                );
            }
        }
    }
    mark_comments_container(&mut out, header);
    out
}

fn is_comments_container(element: &XmlElement) -> bool {
    element.name == "div" && element.attr("type") == Some("comments_container")
}

/// The first top-level comments container (also looked for inside page divs).
fn mark_comments_container(body: &mut XmlElement, header: &DocumentHeader<'_>) {
    let container = body.element_children_mut().find_map(|child| {
        if is_comments_container(child) {
            return Some(child);
        }
        if child.name == "div" && child.attr("type") == Some("page") {
            return child.element_children_mut().find(|c| is_comments_container(c));
        }
        None
    });
    if let Some(container) = container {
        container.set_attr("corresp", header.pid.to_string());
        container.set_attr("source", header.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).expect("valid timestamp")
    }

    fn header<'a>(meta: &'a ArticleMeta) -> DocumentHeader<'a> {
        let crawled = at("2021-03-04T10:00:00+01:00");
        DocumentHeader {
            pid: article_pid("https://example.hu/a", &crawled),
            url: "https://example.hu/a",
            record_id: "<urn:uuid:1>",
            crawl_timestamp: crawled,
            processed_at: at("2024-01-01T00:00:00+00:00"),
            publisher: "Example",
            meta,
        }
    }

    fn find<'e>(root: &'e XmlElement, name: &str) -> Option<&'e XmlElement> {
        if root.name == name {
            return Some(root);
        }
        root.element_children().find_map(|c| find(c, name))
    }

    #[test]
    fn test_pid_is_stable() {
        let crawled = at("2021-03-04T10:00:00+01:00");
        let first = article_pid("https://example.hu/a", &crawled);
        assert_eq!(first, article_pid("https://example.hu/a", &crawled));
        assert_ne!(first, article_pid("https://example.hu/b", &crawled));
    }

    #[test]
    fn test_single_page_document() {
        let meta = ArticleMeta {
            title: Some("Cím".into()),
            alternate_title: Some("Alcím".into()),
            authors: vec!["Kiss Anna".into()],
            keywords: vec!["belföld".into()],
            section: Some("hírek".into()),
            modified: Some(at("2021-03-05T09:00:00+01:00")),
            ..ArticleMeta::default()
        };
        let header = header(&meta);
        let contents = vec![
            XmlElement::new("p").with_text("Szöveg").into(),
            XmlElement::new("div")
                .with_attr("type", "comments_container")
                .with_child(XmlElement::new("div").with_attr("type", "comment"))
                .into(),
        ];
        let tei = build_document(&header, DocumentBody::Single(ConvertedBody::Contents(contents)));

        assert_eq!(tei.attr("xmlns"), Some(TEI_NAMESPACE));
        let body = find(&tei, "body").expect("body");
        let names: Vec<_> = body.element_children().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["head", "head", "p", "div"]);
        let container = body.element_children().last().expect("container");
        assert_eq!(container.attr("corresp"), Some(header.pid.to_string().as_str()));
        assert_eq!(container.attr("source"), Some("https://example.hu/a"));

        let revisions = find(&tei, "revisionDesc").expect("revisions");
        assert_eq!(revisions.element_children().count(), 2);
        assert!(find(&tei, "keywords").is_some());
        assert!(find(&tei, "notesStmt").is_some());
        let date = find(find(&tei, "bibl").expect("bibl"), "date").expect("date");
        assert_eq!(date.attr("when-custom"), Some("unknown"));
    }

    #[test]
    fn test_empty_and_multipage_documents() {
        let meta = ArticleMeta::default();
        let header = header(&meta);

        let empty = build_document(&header, DocumentBody::Single(ConvertedBody::Empty));
        let note = find(&empty, "revisionDesc")
            .and_then(|r| find(r, "note"))
            .expect("empty note");
        assert_eq!(note.text(), EMPTY_ARTICLE_NOTE);
        let body = find(&empty, "body").expect("body");
        assert_eq!(body.element_children().next().map(XmlElement::text).as_deref(), Some("unknown"));
        assert!(body.element_children().nth(1).is_some_and(|p| p.name == "p" && p.children.is_empty()));

        let page = |url: &str, body| PageBody {
            url: url.into(),
            record_id: "r".into(),
            crawl_timestamp: at("2021-03-04T10:00:00+01:00"),
            body,
        };
        let pages = DocumentBody::Pages(vec![
            page("https://example.hu/a", ConvertedBody::Contents(vec![XmlElement::new("p").with_text("1").into()])),
            page("https://example.hu/a?page=2", ConvertedBody::Empty),
        ]);
        let multi = build_document(&header, pages);
        let body = find(&multi, "body").expect("body");
        let divs: Vec<_> = body.element_children().filter(|c| c.name == "div").collect();
        assert_eq!(divs.len(), 2);
        assert_eq!(divs[1].attr("source"), Some("https://example.hu/a?page=2"));
        let note = find(&multi, "revisionDesc")
            .and_then(|r| find(r, "note"))
            .expect("multipage note");
        assert_eq!(note.attr("type"), Some("multipage"));
        assert_eq!(note.element_children().count(), 2);
    }
}
