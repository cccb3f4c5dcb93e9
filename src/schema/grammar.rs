//! Element grammar of the output documents
//!
//! A grammar lists, for every element it knows, the attributes it may carry
//! (optionally with an enumeration of allowed values), the elements allowed
//! as children and a few content constraints. It is loaded once, checked for
//! dangling references, and shared read-only by every validation.

use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

const BUILTIN_GRAMMAR: &str = include_str!("tei_subset.json");

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("failed to read grammar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed grammar: {0}")]
    Json(#[from] serde_json::Error),

    #[error("grammar root element '{0}' is not defined")]
    UnknownRoot(String),

    #[error("element '{element}' refers to undefined element '{reference}'")]
    UnknownReference { element: String, reference: String },

    #[error("element '{element}' requires attribute '{attribute}' it does not allow")]
    UnknownAttribute { element: String, attribute: String },
}

/// Content rules of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementRule {
    /// Allowed attributes; `None` accepts any value
    pub attributes: BTreeMap<String, Option<Vec<String>>>,
    pub required_attributes: Vec<String>,
    /// Allowed child elements
    pub children: Vec<String>,
    pub required_children: Vec<String>,
    /// Non-whitespace text is allowed directly inside
    pub text: bool,
    /// At least one child element is required
    pub non_empty: bool,
    /// Children that may not make up all of the element's children
    pub not_only: Vec<String>,
}

impl ElementRule {
    #[must_use]
    pub fn allows_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    /// `Some(None)` for a free attribute, `Some(Some(values))` for an enumerated one.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Option<&[String]>> {
        self.attributes.get(name).map(Option::as_deref)
    }
}

#[derive(Debug, Deserialize)]
struct GrammarFile {
    root: String,
    elements: BTreeMap<String, ElementRule>,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    root: String,
    elements: AHashMap<String, ElementRule>,
}

static BUILTIN: LazyLock<Arc<Grammar>> = LazyLock::new(|| {
    Arc::new(Grammar::from_json(BUILTIN_GRAMMAR).expect("BUG: bundled grammar is valid"))
});

impl Grammar {
    /// The grammar bundled with the crate.
    #[must_use]
    pub fn builtin() -> Arc<Grammar> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_json(text: &str) -> Result<Self, GrammarError> {
        let file: GrammarFile = serde_json::from_str(text)?;
        if !file.elements.contains_key(&file.root) {
            return Err(GrammarError::UnknownRoot(file.root));
        }
        for (name, rule) in &file.elements {
            let references = rule
                .children
                .iter()
                .chain(&rule.required_children)
                .chain(&rule.not_only);
            for reference in references {
                if !file.elements.contains_key(reference) {
                    return Err(GrammarError::UnknownReference {
                        element: name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
            if let Some(missing) = rule
                .required_children
                .iter()
                .chain(&rule.not_only)
                .find(|r| !rule.allows_child(r))
            {
                return Err(GrammarError::UnknownReference {
                    element: name.clone(),
                    reference: missing.clone(),
                });
            }
            if let Some(attribute) = rule
                .required_attributes
                .iter()
                .find(|a| !rule.attributes.contains_key(*a))
            {
                return Err(GrammarError::UnknownAttribute {
                    element: name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }
        Ok(Self {
            root: file.root,
            elements: file.elements.into_iter().collect(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, GrammarError> {
        let text = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn rule(&self, element: &str) -> Option<&ElementRule> {
        self.elements.get(element)
    }

    /// Names of every defined element.
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_grammar_loads() {
        let grammar = Grammar::builtin();
        assert_eq!(grammar.root(), "TEI");
        let p = grammar.rule("p").expect("p is defined");
        assert!(p.text);
        assert!(p.allows_child("hi"));
        assert!(!p.allows_child("p"));
        assert_eq!(
            grammar.rule("hi").and_then(|r| r.attribute("rend")).flatten().map(<[String]>::len),
            Some(6)
        );
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let text = r#"{"root": "a", "elements": {"a": {"children": ["b"]}}}"#;
        assert!(matches!(
            Grammar::from_json(text),
            Err(GrammarError::UnknownReference { reference, .. }) if reference == "b"
        ));
    }

    #[test]
    fn test_undefined_root_and_bad_json() {
        let text = r#"{"root": "x", "elements": {"a": {}}}"#;
        assert!(matches!(Grammar::from_json(text), Err(GrammarError::UnknownRoot(_))));
        assert!(matches!(Grammar::from_json("{"), Err(GrammarError::Json(_))));
        let text = r#"{"root": "a", "elements": {"a": {"required_attributes": ["id"]}}}"#;
        assert!(matches!(Grammar::from_json(text), Err(GrammarError::UnknownAttribute { .. })));
    }
}
