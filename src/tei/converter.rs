//! Mapping of the rewritten tree onto TEI elements
//!
//! The mapping is total: every kind has a target shape, and kinds without
//! an output counterpart are transparent (their children are emitted in
//! their place). After the element-by-element mapping a few body-level
//! repairs make the result acceptable to the grammar, and whatever nesting
//! the bundled grammar still rejects is conformed to it.

use ego_tree::NodeId;
use tracing::{debug, warn};

use super::element::{XmlElement, XmlNode};
use crate::schema::{Grammar, conform};
use crate::tree::kind::INLINE;
use crate::tree::{DocTree, Kind};

/// Converted article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertedBody {
    /// Top-level body children, ready to be placed under `<body>`
    Contents(Vec<XmlNode>),
    /// Nothing but whitespace survived the rewrite
    Empty,
}

impl ConvertedBody {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ConvertedBody::Empty)
    }
}

/// Output shape of one internal kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Plain(&'static str),
    Rend(&'static str, &'static str),
    /// `floatingText type=…` with an inner `body`
    Floating(&'static str),
    /// `div type=…`
    Div(&'static str),
    Typed(&'static str, &'static str),
    Figure(&'static str),
    SocialMedia,
    /// `row` with a single `cell`
    RowCell,
    Cell,
    Link,
    Transparent,
}

const fn target(kind: Kind) -> Target {
    match kind {
        Kind::Paragraph => Target::Plain("p"),
        Kind::Quote | Kind::InlineQuote => Target::Plain("quote"),
        Kind::List => Target::Plain("list"),
        Kind::ListItem | Kind::Answer => Target::Plain("item"),
        Kind::Note => Target::Plain("note"),
        Kind::RowValid => Target::Plain("row"),
        Kind::Table => Target::Plain("table"),
        Kind::TableHeading => Target::Plain("head"),
        Kind::Emphasized | Kind::Hi => Target::Plain("hi"),

        Kind::Heading => Target::Rend("p", "head"),
        Kind::Source => Target::Rend("p", "ref"),
        Kind::Question => Target::Rend("p", "question"),
        Kind::FeedMeta | Kind::CommentMeta => Target::Rend("p", "meta"),
        Kind::FeedTime | Kind::CommentTime => Target::Rend("p", "time"),
        Kind::FeedAuthor | Kind::CommentAuthor => Target::Rend("p", "author"),
        Kind::Bold => Target::Rend("hi", "bold"),
        Kind::Italic => Target::Rend("hi", "italic"),
        Kind::Underline => Target::Rend("hi", "underline"),
        Kind::Strikeout => Target::Rend("hi", "strikeout"),
        Kind::Superscript => Target::Rend("hi", "superscript"),
        Kind::Subscript => Target::Rend("hi", "subscript"),

        Kind::Lead => Target::Floating("lead"),
        Kind::Box => Target::Floating("frame"),
        Kind::Quiz => Target::Floating("quiz"),
        Kind::Gallery => Target::Floating("gallery"),

        Kind::Forum => Target::Div("forum"),
        Kind::Feed => Target::Div("feed"),
        Kind::Comment => Target::Div("comment"),
        Kind::CommentRoot => Target::Div("comments_container"),
        Kind::AnswerBlock => Target::Typed("list", "quiz"),

        Kind::MediaContent => Target::Figure("media_content"),
        Kind::Figure => Target::Figure("diagram"),
        Kind::EmbeddedContent => Target::Figure("embedded_content"),
        Kind::SocialMedia => Target::SocialMedia,

        Kind::ColumnRow => Target::RowCell,
        Kind::ColumnValid => Target::Cell,
        Kind::Reference | Kind::Ref => Target::Link,

        Kind::Row
        | Kind::Column
        | Kind::SocialHeader
        | Kind::MediaReference
        | Kind::Section
        | Kind::ToUnwrap
        | Kind::ToDecompose => Target::Transparent,
    }
}

/// Convert the rewritten article into TEI body contents.
pub fn convert_body(doc: &DocTree, url: &str) -> ConvertedBody {
    let root = doc.root();
    if doc.real_text_length(root) == 0 && doc.descendant_elements(root).is_empty() {
        warn!(url, "article body is empty");
        return ConvertedBody::Empty;
    }

    let mut contents = top_level(doc, root);
    wrap_first_figure_of_figure_only_body(&mut contents);
    for node in &mut contents {
        if let Some(element) = node.as_element_mut() {
            add_paragraph_to_single_figure_bodies(element);
        }
    }
    group_headless_items(&mut contents, false);

    let mut body = XmlElement::new("body").with_children(contents);
    let repairs = conform(&Grammar::builtin(), &mut body);
    if repairs > 0 {
        warn!(url, repairs, "repaired nesting the output grammar rejects");
    }
    if body.element_children().next().is_none() {
        warn!(url, "nothing left in the article body after repairs");
        return ConvertedBody::Empty;
    }
    debug!(url, top_level = body.children.len(), "converted to TEI");
    ConvertedBody::Contents(body.children)
}

/// Body children: text and inline runs directly under the root go into `p`.
fn top_level(doc: &DocTree, root: NodeId) -> Vec<XmlNode> {
    let mut out = Vec::new();
    let mut run: Option<XmlElement> = None;
    for child in doc.children(root) {
        if let Some(text) = doc.text_of(child) {
            if !text.trim().is_empty() {
                run.get_or_insert_with(|| XmlElement::new("p"))
                    .push(XmlNode::Text(text.to_string()));
            }
            continue;
        }
        if doc.is_any(child, INLINE) {
            run.get_or_insert_with(|| XmlElement::new("p"))
                .children
                .extend(convert_node(doc, child));
            continue;
        }
        if let Some(p) = run.take() {
            out.push(p.into());
        }
        out.extend(convert_node(doc, child));
    }
    if let Some(p) = run {
        out.push(p.into());
    }
    out
}

fn convert_children(doc: &DocTree, id: NodeId) -> Vec<XmlNode> {
    doc.children(id)
        .into_iter()
        .flat_map(|child| convert_node(doc, child))
        .collect()
}

fn convert_node(doc: &DocTree, id: NodeId) -> Vec<XmlNode> {
    if let Some(text) = doc.text_of(id) {
        return vec![XmlNode::Text(text.to_string())];
    }
    let Some(element) = doc.element(id) else {
        return Vec::new();
    };
    let Some(kind) = element.label.kind() else {
        return convert_children(doc, id);
    };
    let lang = element.attr("xml:lang");
    let link = element.attr("target");
    let original = element.attr("original");

    let mut out = match target(kind) {
        Target::Transparent => return convert_children(doc, id),
        Target::Plain(name) => XmlElement::new(name).with_children(convert_children(doc, id)),
        Target::Rend(name, rend) => XmlElement::new(name)
            .with_attr("rend", rend)
            .with_children(convert_children(doc, id)),
        Target::Div(variant) => XmlElement::new("div")
            .with_attr("type", variant)
            .with_children(convert_children(doc, id)),
        Target::Typed(name, variant) => XmlElement::new(name)
            .with_attr("type", variant)
            .with_children(convert_children(doc, id)),
        Target::Floating(variant) => {
            let mut body = XmlElement::new("body").with_children(convert_children(doc, id));
            if matches!(variant, "frame" | "gallery") {
                wrap_direct_figures(&mut body);
            }
            XmlElement::new("floatingText").with_attr("type", variant).with_child(body)
        }
        Target::SocialMedia => {
            let mut body = XmlElement::new("body").with_children(convert_children(doc, id));
            if body.element_children().next().is_none() {
                body.push(XmlElement::new("p"));
            }
            if let Some(original) = original {
                body.push(corrected_link_note(original));
            }
            let mut floating = XmlElement::new("floatingText").with_attr("type", "social_media_content");
            if let Some(link) = link {
                floating.set_attr("facs", link);
            }
            floating.with_child(body)
        }
        Target::Figure(rend) => {
            let mut figure = XmlElement::new("figure").with_attr("rend", rend);
            if let Some(link) = link {
                figure.set_attr("facs", link);
            }
            figure.children = convert_children(doc, id);
            if let Some(original) = original {
                figure.set_attr("type", "corrected");
                figure.set_attr("resp", "script");
                figure.push(corrected_link_note(original));
            }
            figure
        }
        Target::RowCell => XmlElement::new("row")
            .with_child(XmlElement::new("cell").with_children(convert_children(doc, id))),
        Target::Cell => {
            let mut cell = XmlElement::new("cell");
            for child in doc.children(id) {
                if doc.is_kind(child, Kind::Paragraph) {
                    cell.children.extend(convert_children(doc, child));
                } else {
                    cell.children.extend(convert_node(doc, child));
                }
            }
            cell
        }
        Target::Link => {
            let mut reference = XmlElement::new("ref");
            if let Some(link) = link {
                reference.set_attr("target", link);
            }
            reference.children = convert_children(doc, id);
            if let Some(original) = original {
                reference.set_attr("type", if link.is_some() { "corrected" } else { "deleted" });
                reference.set_attr("resp", "script");
                reference.push(
                    XmlElement::new("note")
                        .with_child(XmlElement::new("ref").with_attr("type", "original").with_text(original)),
                );
            }
            reference
        }
    };

    if let Some(lang) = lang {
        out.set_attr("xml:lang", lang);
    }
    vec![out.into()]
}

/// `note corresp=facs` carrying the link as it appeared in the source.
fn corrected_link_note(original: &str) -> XmlElement {
    XmlElement::new("note")
        .with_attr("corresp", "facs")
        .with_attr("type", "corrected")
        .with_attr("resp", "script")
        .with_text(original)
}

fn wrap_direct_figures(body: &mut XmlElement) {
    for child in &mut body.children {
        if child.is("figure") {
            let figure = std::mem::replace(child, XmlNode::Text(String::new()));
            *child = XmlElement::new("p").with_child(figure).into();
        }
    }
}

fn wrap_first_figure_of_figure_only_body(contents: &mut [XmlNode]) {
    let mut elements = contents.iter().filter_map(XmlNode::as_element).peekable();
    if elements.peek().is_none() || !elements.all(|e| e.name == "figure") {
        return;
    }
    if let Some(first) = contents.iter_mut().find(|n| n.is("figure")) {
        let figure = std::mem::replace(first, XmlNode::Text(String::new()));
        *first = XmlElement::new("p").with_child(figure).into();
    }
}

/// A floating text whose body holds nothing but one figure gets a `p` level.
fn add_paragraph_to_single_figure_bodies(element: &mut XmlElement) {
    if element.name == "body" {
        let single_figure = {
            let mut elements = element.element_children();
            matches!((elements.next(), elements.next()), (Some(only), None) if only.name == "figure")
        };
        if single_figure {
            let children = std::mem::take(&mut element.children);
            element.children = vec![XmlElement::new("p").with_children(children).into()];
        }
    }
    for child in element.element_children_mut() {
        add_paragraph_to_single_figure_bodies(child);
    }
}

/// Put runs of `item` elements that are not inside a `list` into a new list.
fn group_headless_items(children: &mut Vec<XmlNode>, parent_is_list: bool) {
    for child in children.iter_mut() {
        if let Some(element) = child.as_element_mut() {
            let is_list = element.name == "list";
            group_headless_items(&mut element.children, is_list);
        }
    }
    if parent_is_list || !children.iter().any(|c| c.is("item")) {
        return;
    }

    let mut grouped = Vec::with_capacity(children.len());
    let mut run: Option<XmlElement> = None;
    for child in children.drain(..) {
        if child.is("item") {
            run.get_or_insert_with(|| XmlElement::new("list")).push(child);
        } else if run.is_some() && child.is_blank_text() {
            continue;
        } else {
            if let Some(list) = run.take() {
                grouped.push(list.into());
            }
            grouped.push(child);
        }
    }
    if let Some(list) = run {
        grouped.push(list.into());
    }
    *children = grouped;
}
