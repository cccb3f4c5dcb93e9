//! Attribute value simplification used to freeze signatures
//!
//! Attribute values that are unique per article (ids, sizes, links) are
//! folded into a handful of placeholders so that structurally identical
//! elements share one dictionary row.

use serde::{Deserialize, Serialize};

use super::signature::TagSignature;
use crate::config::Thresholds;
use crate::utils::MEDIA_DESCENDANT_PREFIX;

/// Keys whose presence marks a presentational attribute.
const STYLE_MARKERS: [&str; 9] = [
    "highlight", "width", "height", "align", "style", "sizset", "sizcache", "size", "face",
];

const LINK_KEYS: [&str; 5] = ["href", "url", "data-mce-href", "src", "data-src"];

const LINK_MARKERS: [&str; 2] = ["http", "www"];

/// Attributes whose value is a whitespace-separated token list.
const MULTI_VALUED: [&str; 7] = [
    "class",
    "rel",
    "rev",
    "headers",
    "accesskey",
    "accept-charset",
    "dropzone",
];

const REFERENCE_TAGS: [&str; 2] = ["a", "img"];

const TABLE_TAGS: [&str; 6] = ["table", "td", "tr", "th", "thead", "tbody"];

const TABLE_LAYOUT_ATTRS: [&str; 7] = [
    "cellpadding",
    "cellspacing",
    "height",
    "width",
    "border",
    "align",
    "style",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttrValue {
    fn parse(key: &str, raw: &str) -> Self {
        if MULTI_VALUED.contains(&key) {
            AttrValue::Multi(raw.split_whitespace().map(str::to_string).collect())
        } else {
            AttrValue::Single(raw.to_string())
        }
    }

    fn joined(&self) -> String {
        match self {
            AttrValue::Single(value) => value.clone(),
            AttrValue::Multi(values) => values.join(" "),
        }
    }
}

/// Working copy of an element's attributes while it is being frozen.
pub type FreezeAttrs = Vec<(String, AttrValue)>;

/// Portal-specific attribute rewriting applied before simplification.
pub trait AttributeFilter: Send + Sync + std::fmt::Debug {
    fn apply(&self, tag: &str, attrs: &mut FreezeAttrs);
}

/// One declarative exclusion rule from the portal configuration.
///
/// Without `replace_with` the attribute is dropped; with it the value is
/// replaced by the given placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeExclusion {
    #[serde(default)]
    pub tag: Option<String>,
    pub key: String,
    #[serde(default)]
    pub replace_with: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfiguredExclusions {
    rules: Vec<AttributeExclusion>,
}

impl ConfiguredExclusions {
    #[must_use]
    pub fn new(rules: Vec<AttributeExclusion>) -> Self {
        Self { rules }
    }
}

impl AttributeFilter for ConfiguredExclusions {
    fn apply(&self, tag: &str, attrs: &mut FreezeAttrs) {
        for rule in &self.rules {
            if rule.tag.as_deref().is_some_and(|t| t != tag) {
                continue;
            }
            match &rule.replace_with {
                Some(placeholder) => {
                    for (key, value) in attrs.iter_mut() {
                        if *key == rule.key {
                            *value = AttrValue::Single(placeholder.clone());
                        }
                    }
                }
                None => attrs.retain(|(key, _)| *key != rule.key),
            }
        }
    }
}

fn base_name(tag: &str) -> &str {
    tag.strip_prefix(MEDIA_DESCENDANT_PREFIX).unwrap_or(tag)
}

fn has_style_marker(text: &str) -> bool {
    STYLE_MARKERS.iter().any(|m| text.contains(m))
}

/// Fold a value into `@NUM`, `@LONG` or `@<run>NUM` when it looks like an id.
#[must_use]
pub fn simplify_alphanumeric(value: &str, thresholds: &Thresholds) -> String {
    let digits = value.chars().filter(|c| c.is_numeric()).count();
    let alphas = value.chars().filter(|c| c.is_alphabetic()).count();

    if !value.is_empty() && digits == value.chars().count() {
        return "@NUM".to_string();
    }
    if value.chars().count() > thresholds.long_attribute_value {
        return "@LONG".to_string();
    }
    if digits > 0 && alphas > 0 {
        let longest = value
            .split(|c: char| !c.is_alphabetic())
            .max_by_key(|run| run.chars().count())
            .unwrap_or_default();
        if longest.chars().count() > thresholds.meaningful_alpha_run {
            return format!("@{longest}NUM");
        }
        return "@NUM".to_string();
    }
    value.to_string()
}

fn simplify_style_like(value: &str, thresholds: &Thresholds) -> String {
    if has_style_marker(value) {
        "@STYLE".to_string()
    } else {
        simplify_alphanumeric(value, thresholds)
    }
}

/// Freeze an element into its dictionary signature.
#[must_use]
pub fn freeze(
    tag: &str,
    raw_attrs: &[(String, String)],
    filter: &dyn AttributeFilter,
    thresholds: &Thresholds,
) -> TagSignature {
    let mut attrs: FreezeAttrs = raw_attrs
        .iter()
        .map(|(k, v)| (k.clone(), AttrValue::parse(k, v)))
        .collect();
    filter.apply(tag, &mut attrs);

    let base = base_name(tag);
    if REFERENCE_TAGS.contains(&base) {
        for (key, value) in &mut attrs {
            match key.as_str() {
                "title" | "data-title" => *value = AttrValue::Single("@title".into()),
                "alt" => *value = AttrValue::Single("@alt".into()),
                _ => {}
            }
        }
    }

    for (key, value) in &mut attrs {
        if matches!(value, AttrValue::Single(v) if v.starts_with('@')) {
            continue;
        }
        let text = value.joined();
        if has_style_marker(key) {
            *value = AttrValue::Single("@STYLE".into());
        } else if LINK_MARKERS.iter().any(|m| text.contains(m)) || LINK_KEYS.contains(&key.as_str()) {
            *value = AttrValue::Single("@LINK".into());
        } else if key.contains("color") {
            *value = AttrValue::Single(String::new());
        } else if key == "target" {
            *value = AttrValue::Single("@target".into());
        }

        match value {
            AttrValue::Single(v) if !v.starts_with('@') => *v = simplify_style_like(v, thresholds),
            AttrValue::Multi(values) => {
                for v in values.iter_mut() {
                    *v = simplify_style_like(v, thresholds);
                }
            }
            AttrValue::Single(_) => {}
        }
    }

    if TABLE_TAGS.contains(&base) {
        attrs.retain(|(key, _)| !TABLE_LAYOUT_ATTRS.contains(&key.as_str()));
    }

    TagSignature::new(
        tag,
        attrs.into_iter().map(|(k, v)| (k, v.joined())).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn frozen(tag: &str, pairs: &[(&str, &str)]) -> String {
        freeze(
            tag,
            &attrs(pairs),
            &ConfiguredExclusions::default(),
            &Thresholds::default(),
        )
        .to_string()
    }

    #[test]
    fn test_alphanumeric_simplification() {
        let t = Thresholds::default();
        assert_eq!(simplify_alphanumeric("35", &t), "@NUM");
        assert_eq!(simplify_alphanumeric("p2", &t), "@NUM");
        assert_eq!(simplify_alphanumeric("attachment_6904733", &t), "@attachmentNUM");
        assert_eq!(simplify_alphanumeric(&"x".repeat(31), &t), "@LONG");
        assert_eq!(simplify_alphanumeric("lead", &t), "lead");
        assert_eq!(simplify_alphanumeric("", &t), "");
    }

    #[test]
    fn test_wordpress_caption_signature() {
        assert_eq!(
            frozen(
                "div",
                &[
                    ("id", "attachment_6904733"),
                    ("class", "wp-caption aligncenter size-full"),
                    ("style", "width: 300px"),
                ],
            ),
            "<div class=wp-caption @STYLE @STYLE id=@attachmentNUM style=@STYLE>"
        );
    }

    #[test]
    fn test_links_and_reference_titles() {
        assert_eq!(
            frozen(
                "a",
                &[("href", "/belfold/x"), ("title", "Read more"), ("target", "_blank")],
            ),
            "<a href=@LINK target=@target title=@title>"
        );
        assert_eq!(
            frozen("div", &[("data-embed", "https://youtube.com/x")]),
            "<div data-embed=@LINK>"
        );
    }

    #[test]
    fn test_colour_and_table_layout() {
        assert_eq!(frozen("font", &[("color", "#ff0000")]), "<font color=>");
        assert_eq!(
            frozen("0_MDESC_td", &[("width", "50%"), ("class", "cell")]),
            "<0_MDESC_td class=cell>"
        );
    }

    #[test]
    fn test_configured_exclusions() {
        let filter = ConfiguredExclusions::new(vec![
            AttributeExclusion {
                tag: Some("time".into()),
                key: "title".into(),
                replace_with: Some("@TITLE".into()),
            },
            AttributeExclusion {
                tag: None,
                key: "data-reactid".into(),
                replace_with: None,
            },
        ]);
        let sig = freeze(
            "time",
            &attrs(&[("title", "2021-03-01 10:00"), ("data-reactid", "x")]),
            &filter,
            &Thresholds::default(),
        );
        assert_eq!(sig.to_string(), "<time title=@TITLE>");
    }
}
