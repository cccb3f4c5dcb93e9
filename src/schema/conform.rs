//! Grammar-driven repair of element nesting
//!
//! A child its parent may not hold is moved into the first filler element
//! that accepts it, or replaced by its own children when no filler does.
//! Elements that must have element children are dropped once they end up
//! hollow, and an element made only of `not_only` children gets its first
//! one wrapped.

use std::collections::VecDeque;
use tracing::debug;

use super::grammar::{ElementRule, Grammar};
use crate::tei::element::{XmlElement, XmlNode};

/// Elements created to hold content that may not sit directly in its parent.
const FILLERS: [&str; 5] = ["p", "item", "cell", "row", "body"];

/// Longest filler chain tried, as in `table` > `row` > `cell` > `p`.
const MAX_FILLER_DEPTH: usize = 4;

/// Make the subtree of `element` acceptable to `grammar`.
///
/// Returns the number of repairs; elements the grammar does not define are
/// left as they are.
pub fn conform(grammar: &Grammar, element: &mut XmlElement) -> usize {
    let Some(rule) = grammar.rule(&element.name) else {
        return 0;
    };
    let mut repairs = 0;
    let mut pending: VecDeque<XmlNode> = std::mem::take(&mut element.children).into();
    let mut kept = Vec::with_capacity(pending.len());

    while let Some(node) = pending.pop_front() {
        if allowed(rule, &node) {
            match node {
                XmlNode::Element(mut child) => {
                    repairs += conform(grammar, &mut child);
                    if is_hollow(grammar, &child) {
                        debug!(parent = %element.name, child = %child.name, "hollow element dropped");
                        repairs += 1;
                    } else {
                        kept.push(child.into());
                    }
                }
                text => kept.push(text),
            }
            continue;
        }

        repairs += 1;
        if let Some(name) = filler(grammar, rule, &node) {
            let mut wrapper = XmlElement::new(name).with_child(node);
            while pending.front().is_some_and(|next| {
                next.is_blank_text() || (!allowed(rule, next) && filler(grammar, rule, next) == Some(name))
            }) {
                if let Some(next) = pending.pop_front() {
                    wrapper.push(next);
                }
            }
            debug!(parent = %element.name, filler = name, "misplaced content wrapped");
            repairs += conform(grammar, &mut wrapper);
            if !is_hollow(grammar, &wrapper) {
                kept.push(wrapper.into());
            }
            continue;
        }
        match node {
            XmlNode::Element(child) => {
                debug!(parent = %element.name, child = %child.name, "misplaced element unwrapped");
                for grandchild in child.children.into_iter().rev() {
                    pending.push_front(grandchild);
                }
            }
            XmlNode::Text(_) => debug!(parent = %element.name, "misplaced text dropped"),
        }
    }

    element.children = kept;
    repairs + settle_not_only(grammar, rule, element)
}

fn allowed(rule: &ElementRule, node: &XmlNode) -> bool {
    match node {
        XmlNode::Text(text) => rule.text || text.trim().is_empty(),
        XmlNode::Element(child) => rule.allows_child(&child.name),
    }
}

/// Whether `name` can hold `node`, directly or through further fillers.
fn accepts(grammar: &Grammar, name: &str, node: &XmlNode, depth: usize) -> bool {
    let Some(rule) = grammar.rule(name) else {
        return false;
    };
    allowed(rule, node)
        || (depth < MAX_FILLER_DEPTH
            && FILLERS
                .iter()
                .any(|f| rule.allows_child(f) && accepts(grammar, f, node, depth + 1)))
}

fn filler(grammar: &Grammar, rule: &ElementRule, node: &XmlNode) -> Option<&'static str> {
    FILLERS
        .into_iter()
        .find(|f| rule.allows_child(f) && accepts(grammar, f, node, 1))
}

fn is_hollow(grammar: &Grammar, element: &XmlElement) -> bool {
    let Some(rule) = grammar.rule(&element.name) else {
        return false;
    };
    let childless = element.element_children().next().is_none();
    let missing = rule
        .required_children
        .iter()
        .any(|r| !element.element_children().any(|c| &c.name == r));
    (rule.non_empty && childless) || missing
}

fn settle_not_only(grammar: &Grammar, rule: &ElementRule, element: &mut XmlElement) -> usize {
    if rule.not_only.is_empty() {
        return 0;
    }
    let only = {
        let mut names = element.element_children().map(|c| c.name.as_str()).peekable();
        names.peek().is_some() && names.all(|n| rule.not_only.iter().any(|o| o == n))
    };
    if !only {
        return 0;
    }
    let Some(index) = element.children.iter().position(|c| c.as_element().is_some()) else {
        return 0;
    };
    let Some(name) = filler(grammar, rule, &element.children[index]) else {
        return 0;
    };
    let node = std::mem::replace(&mut element.children[index], XmlNode::Text(String::new()));
    element.children[index] = XmlElement::new(name).with_child(node).into();
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validator::validate;

    fn hi(text: &str) -> XmlElement {
        XmlElement::new("hi").with_attr("rend", "bold").with_text(text)
    }

    fn floating(body: XmlElement) -> XmlElement {
        XmlElement::new("floatingText").with_attr("type", "frame").with_child(body)
    }

    fn document(body: XmlElement) -> XmlElement {
        let header = XmlElement::new("teiHeader").with_child(
            XmlElement::new("fileDesc")
                .with_child(XmlElement::new("titleStmt").with_child(XmlElement::new("title").with_text("t")))
                .with_child(XmlElement::new("publicationStmt").with_child(XmlElement::new("publisher").with_text("p")))
                .with_child(
                    XmlElement::new("sourceDesc").with_child(
                        XmlElement::new("bibl")
                            .with_child(XmlElement::new("title").with_text("t"))
                            .with_child(XmlElement::new("date").with_attr("when-custom", "unknown")),
                    ),
                ),
        );
        XmlElement::new("TEI")
            .with_attr("xmlns", "http://www.tei-c.org/ns/1.0")
            .with_child(header)
            .with_child(XmlElement::new("text").with_child(body))
    }

    #[test]
    fn test_valid_body_is_untouched() {
        let grammar = Grammar::builtin();
        let mut body = XmlElement::new("body")
            .with_child(XmlElement::new("p").with_text("a ").with_child(hi("b")))
            .with_child(XmlElement::new("list").with_child(XmlElement::new("item").with_text("c")));
        let before = body.clone();
        assert_eq!(conform(&grammar, &mut body), 0);
        assert_eq!(body, before);
    }

    #[test]
    fn test_block_inside_highlight_is_flattened() {
        let grammar = Grammar::builtin();
        let list = XmlElement::new("list").with_child(XmlElement::new("item").with_text("a"));
        let frame = floating(XmlElement::new("body").with_child(XmlElement::new("p").with_text("y")));
        let mut body = XmlElement::new("body").with_child(
            XmlElement::new("p").with_child(
                XmlElement::new("hi")
                    .with_attr("rend", "italic")
                    .with_child(list)
                    .with_child(frame),
            ),
        );

        assert!(conform(&grammar, &mut body) > 0);
        let expected = XmlElement::new("body").with_child(
            XmlElement::new("p").with_child(
                XmlElement::new("hi")
                    .with_attr("rend", "italic")
                    .with_text("a")
                    .with_text("y"),
            ),
        );
        assert_eq!(body, expected);
        assert_eq!(validate(&grammar, &document(body)), Ok(()));
    }

    #[test]
    fn test_misplaced_content_gets_fillers() {
        let grammar = Grammar::builtin();
        let mut body = XmlElement::new("body")
            .with_child(
                XmlElement::new("list")
                    .with_child(hi("egy"))
                    .with_text(" ")
                    .with_child(hi("kettő"))
                    .with_child(XmlElement::new("item").with_child(XmlElement::new("head").with_text("cím"))),
            )
            .with_child(XmlElement::new("table").with_text("cella"));

        conform(&grammar, &mut body);
        let list = XmlElement::new("list")
            .with_child(XmlElement::new("item").with_child(hi("egy")).with_text(" ").with_child(hi("kettő")))
            .with_child(XmlElement::new("item").with_text("cím"));
        let table = XmlElement::new("table").with_child(
            XmlElement::new("row").with_child(XmlElement::new("cell").with_text("cella")),
        );
        assert_eq!(body, XmlElement::new("body").with_child(list).with_child(table));
        assert_eq!(validate(&grammar, &document(body)), Ok(()));
    }

    #[test]
    fn test_hollow_blocks_are_dropped() {
        let grammar = Grammar::builtin();
        let mut body = XmlElement::new("body")
            .with_child(XmlElement::new("p").with_text("szöveg"))
            .with_child(floating(XmlElement::new("body").with_text("  ")))
            .with_child(XmlElement::new("list"));

        assert_eq!(conform(&grammar, &mut body), 3);
        assert_eq!(
            body,
            XmlElement::new("body").with_child(XmlElement::new("p").with_text("szöveg"))
        );
    }

    #[test]
    fn test_figure_only_body_gets_a_paragraph() {
        let grammar = Grammar::builtin();
        let figure = XmlElement::new("figure").with_attr("rend", "media_content");
        let mut body = floating(XmlElement::new("body").with_child(figure.clone()));

        assert_eq!(conform(&grammar, &mut body), 1);
        let inner = body.element_children().next().and_then(|b| b.element_children().next());
        assert_eq!(inner, Some(&XmlElement::new("p").with_child(figure)));
    }
}
