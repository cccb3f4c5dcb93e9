//! Node payloads stored in the document arena

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::kind::Kind;

/// Attribute list of an element.
///
/// After normalization an element keeps at most `target`, `original` and
/// `xml:lang`, so the list lives inline.
pub type Attrs = SmallVec<[(String, String); 2]>;

/// Name of an element at some stage of the pipeline.
///
/// Freshly imported elements carry their HTML name. Normalization replaces it
/// with a canonical [`Kind`] or with a portal-specific intermediate label that
/// only bigram and block rules understand; cleaning unwraps whatever is still
/// not a built-in kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Html(String),
    Kind(Kind),
    Custom(String),
}

impl Label {
    /// Parse a label name used in configuration.
    ///
    /// `unwrap`, `null` and `default` are the dictionary spellings of
    /// "drop this level"; `decompose` drops the subtree.
    #[must_use]
    pub fn parse(name: &str) -> Label {
        let name = name.trim();
        match name {
            "unwrap" | "null" | "default" | "to_unwrap" => Label::Kind(Kind::ToUnwrap),
            "decompose" | "to_decompose" => Label::Kind(Kind::ToDecompose),
            other => match other.parse::<Kind>() {
                Ok(kind) => Label::Kind(kind),
                Err(_) => Label::Custom(other.to_string()),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Label::Kind(kind) => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == Some(kind)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Label::Html(name) | Label::Custom(name) => name,
            Label::Kind(kind) => kind.as_str(),
        }
    }
}

impl From<Kind> for Label {
    fn from(kind: Kind) -> Self {
        Label::Kind(kind)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::parse(&name)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub label: Label,
    pub attrs: Attrs,
}

impl Element {
    #[must_use]
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            attrs: Attrs::new(),
        }
    }

    #[must_use]
    pub fn html(name: &str, attrs: Attrs) -> Self {
        Self {
            label: Label::Html(name.to_string()),
            attrs,
        }
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == key)
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocNode {
    /// Synthetic root standing for the selected article body
    Root,
    Element(Element),
    Text(String),
}

impl DocNode {
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DocNode::Element(element) => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DocNode::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_aliases() {
        assert_eq!(Label::parse("null"), Label::Kind(Kind::ToUnwrap));
        assert_eq!(Label::parse("default"), Label::Kind(Kind::ToUnwrap));
        assert_eq!(Label::parse("decompose"), Label::Kind(Kind::ToDecompose));
        assert_eq!(Label::parse("box"), Label::Kind(Kind::Box));
        assert_eq!(
            Label::parse("framed_photo"),
            Label::Custom("framed_photo".to_string())
        );
    }

    #[test]
    fn test_set_attr_replaces_existing() {
        let mut el = Element::new(Kind::Reference);
        el.set_attr("target", "https://a.example/");
        el.set_attr("target", "https://b.example/");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.attr("target"), Some("https://b.example/"));
    }
}
