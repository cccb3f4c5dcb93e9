//! Validation of output documents against a [`Grammar`]

use thiserror::Error;

use super::grammar::Grammar;
use crate::tei::element::{XmlElement, XmlNode};
use crate::tei::serialize::{XmlReadError, from_bytes};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("root element must be <{expected}>")]
    WrongRoot { expected: String },

    #[error("element is not defined by the grammar")]
    UnknownElement,

    #[error("<{0}> is not allowed here")]
    ChildNotAllowed(String),

    #[error("attribute '{0}' is not allowed")]
    AttributeNotAllowed(String),

    #[error("attribute '{attribute}' has invalid value '{value}'")]
    AttributeValue { attribute: String, value: String },

    #[error("required attribute '{0}' is missing")]
    MissingAttribute(String),

    #[error("required child <{0}> is missing")]
    MissingChild(String),

    #[error("text is not allowed here")]
    TextNotAllowed,

    #[error("element must have child elements")]
    Empty,

    #[error("element may not contain only <{0}> children")]
    OnlyChildren(String),
}

/// First violation found, with the location of the offending element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {violation}")]
pub struct ValidationError {
    /// `/TEI/text/body/p[2]` style location
    pub path: String,
    pub violation: Violation,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Parse(#[from] XmlReadError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Validate an element tree; the root must be the grammar's root element.
pub fn validate(grammar: &Grammar, root: &XmlElement) -> Result<(), ValidationError> {
    let path = format!("/{}", root.name);
    if root.name != grammar.root() {
        return Err(ValidationError {
            path,
            violation: Violation::WrongRoot {
                expected: grammar.root().to_string(),
            },
        });
    }
    check(grammar, root, &path)
}

/// Parse serialized bytes and validate them.
pub fn validate_bytes(grammar: &Grammar, bytes: &[u8]) -> Result<(), DocumentError> {
    let root = from_bytes(bytes)?;
    validate(grammar, &root)?;
    Ok(())
}

fn check(grammar: &Grammar, element: &XmlElement, path: &str) -> Result<(), ValidationError> {
    let fail = |violation: Violation| -> Result<(), ValidationError> {
        Err(ValidationError {
            path: path.to_string(),
            violation,
        })
    };
    let Some(rule) = grammar.rule(&element.name) else {
        return fail(Violation::UnknownElement);
    };

    for (key, value) in &element.attrs {
        match rule.attribute(key) {
            None => return fail(Violation::AttributeNotAllowed(key.clone())),
            Some(Some(values)) if !values.iter().any(|v| v == value) => {
                return fail(Violation::AttributeValue {
                    attribute: key.clone(),
                    value: value.clone(),
                });
            }
            Some(_) => {}
        }
    }
    if let Some(missing) = rule
        .required_attributes
        .iter()
        .find(|a| element.attr(a).is_none())
    {
        return fail(Violation::MissingAttribute(missing.clone()));
    }

    let has_text = element
        .children
        .iter()
        .any(|c| matches!(c, XmlNode::Text(_)) && !c.is_blank_text());
    if has_text && !rule.text {
        return fail(Violation::TextNotAllowed);
    }

    if let Some(bad) = element.element_children().find(|c| !rule.allows_child(&c.name)) {
        return fail(Violation::ChildNotAllowed(bad.name.clone()));
    }
    if let Some(missing) = rule
        .required_children
        .iter()
        .find(|r| !element.element_children().any(|c| &c.name == *r))
    {
        return fail(Violation::MissingChild(missing.clone()));
    }
    let mut children = element.element_children().peekable();
    if rule.non_empty && children.peek().is_none() {
        return fail(Violation::Empty);
    }
    if !rule.not_only.is_empty() && children.peek().is_some() {
        let mut names = element.element_children().map(|c| c.name.as_str());
        if names.all(|n| rule.not_only.iter().any(|o| o == n)) {
            return fail(Violation::OnlyChildren(rule.not_only.join("|")));
        }
    }

    let mut seen: ahash::AHashMap<&str, usize> = ahash::AHashMap::new();
    for child in element.element_children() {
        let index = seen.entry(child.name.as_str()).or_insert(0);
        *index += 1;
        check(grammar, child, &format!("{path}/{}[{index}]", child.name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(body: XmlElement) -> XmlElement {
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
    fn test_valid_document() {
        let grammar = Grammar::builtin();
        let body = XmlElement::new("body").with_child(
            XmlElement::new("p")
                .with_text("Hello ")
                .with_child(XmlElement::new("hi").with_attr("rend", "bold").with_text("world")),
        );
        assert_eq!(validate(&grammar, &minimal(body)), Ok(()));
    }

    #[test]
    fn test_violations_carry_their_path() {
        let grammar = Grammar::builtin();

        let nested = XmlElement::new("body").with_child(XmlElement::new("p").with_child(XmlElement::new("p")));
        let err = validate(&grammar, &minimal(nested)).expect_err("p in p");
        assert_eq!(err.path, "/TEI/text[1]/body[1]/p[1]");
        assert_eq!(err.violation, Violation::ChildNotAllowed("p".into()));

        let bad_rend = XmlElement::new("body")
            .with_child(XmlElement::new("p").with_child(XmlElement::new("hi").with_attr("rend", "blink")));
        let err = validate(&grammar, &minimal(bad_rend)).expect_err("bad rend");
        assert!(matches!(err.violation, Violation::AttributeValue { .. }));

        let figures_only = XmlElement::new("body")
            .with_child(XmlElement::new("figure").with_attr("rend", "media_content"));
        let err = validate(&grammar, &minimal(figures_only)).expect_err("only figures");
        assert!(matches!(err.violation, Violation::OnlyChildren(_)));

        let text_in_body = XmlElement::new("body").with_text("loose");
        let err = validate(&grammar, &minimal(text_in_body)).expect_err("naked text");
        assert_eq!(err.violation, Violation::TextNotAllowed);
    }

    #[test]
    fn test_validate_bytes_reports_parse_errors() {
        let grammar = Grammar::builtin();
        assert!(matches!(
            validate_bytes(&grammar, b"<TEI><text>"),
            Err(DocumentError::Parse(_))
        ));
        assert!(matches!(
            validate_bytes(&grammar, b"<div/>"),
            Err(DocumentError::Invalid(ValidationError {
                violation: Violation::WrongRoot { .. },
                ..
            }))
        ));
    }
}
