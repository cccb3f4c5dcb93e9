//! Frozen tag signatures: the dictionary key of an element
//!
//! A signature is the tag name plus its simplified attributes sorted by key,
//! rendered as `<name key=value key2=value2>`. The rendering is the exact
//! text found in the first data column of dictionary TSV files.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSignature {
    pub name: String,
    /// Sorted by key; multi-valued attributes are joined with a space
    pub attrs: Vec<(String, String)>,
}

impl TagSignature {
    #[must_use]
    pub fn new(name: impl Into<String>, mut attrs: Vec<(String, String)>) -> Self {
        for (_, value) in &mut attrs {
            if value.contains('\n') {
                *value = value.replace('\n', " ");
            }
        }
        attrs.sort();
        Self {
            name: name.into(),
            attrs,
        }
    }
}

impl fmt::Display for TagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(f, " {key}={value}")?;
        }
        f.write_str(">")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a tag signature: '{0}'")]
pub struct SignatureParseError(pub String);

fn starts_pair(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    let key_like = !key.is_empty()
        && !key.starts_with('@')
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'));
    key_like.then_some((key, value))
}

impl FromStr for TagSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| SignatureParseError(s.to_string()))?;

        let mut tokens = inner.split(' ');
        let name = tokens
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SignatureParseError(s.to_string()))?;

        let mut attrs: Vec<(String, String)> = Vec::new();
        for token in tokens {
            match (starts_pair(token), attrs.last_mut()) {
                (Some((key, value)), _) => attrs.push((key.to_string(), value.to_string())),
                (None, Some((_, value))) => {
                    value.push(' ');
                    value.push_str(token);
                }
                (None, None) => return Err(SignatureParseError(s.to_string())),
            }
        }
        Ok(TagSignature::new(name, attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_sorts_attributes() {
        let sig = TagSignature::new(
            "div",
            vec![
                ("style".into(), "@STYLE".into()),
                ("class".into(), "wp-caption @STYLE".into()),
            ],
        );
        assert_eq!(sig.to_string(), "<div class=wp-caption @STYLE style=@STYLE>");
    }

    #[test]
    fn test_parse_multi_valued_and_empty_values() {
        let sig: TagSignature = "<div class=wp-caption @STYLE color= id=@attachmentNUM>"
            .parse()
            .expect("valid signature");
        assert_eq!(sig.name, "div");
        assert_eq!(
            sig.attrs,
            vec![
                ("class".to_string(), "wp-caption @STYLE".to_string()),
                ("color".to_string(), String::new()),
                ("id".to_string(), "@attachmentNUM".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_bare_tag() {
        let sig: TagSignature = "<0_MDESC_p>".parse().expect("valid signature");
        assert_eq!(sig, TagSignature::new("0_MDESC_p", Vec::new()));
        assert!("div class=x".parse::<TagSignature>().is_err());
    }

    #[test]
    fn test_newlines_fold_into_spaces() {
        let sig = TagSignature::new("span", vec![("title".into(), "a\nb".into())]);
        assert_eq!(sig.to_string(), "<span title=a b>");
    }

    #[test]
    fn test_parse_error_names_the_input() {
        let err = "div class=x".parse::<TagSignature>().expect_err("no brackets");
        assert_eq!(err.to_string(), "not a tag signature: 'div class=x'");
        let source: Box<dyn std::error::Error> = Box::new(err);
        assert!(source.source().is_none());
    }
}
