//! Bigram rules: relabel a parent and its descendants by their combination

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::tree::node::Label;

/// How strictly the second label must relate to the parent.
///
/// Ordered from the strictest to the most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigramMode {
    /// Only child kind, and the parent has no text of its own
    #[serde(alias = "to_merge")]
    Merge,
    /// Only child kind; the parent may have text of its own
    #[serde(alias = "det_by_child")]
    OwnText,
    /// One of the direct children
    #[serde(alias = "det_by_any_child")]
    AnyChild,
    /// Anywhere below the parent
    #[serde(alias = "det_by_any_desc")]
    AnyDescendant,
}

/// One configured bigram rule as it appears in the portal JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BigramRuleConfig {
    pub parent: Label,
    pub child: Label,
    pub mode: BigramMode,
    pub new_parent: Label,
    pub new_child: Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigramRule {
    pub child: Label,
    pub mode: BigramMode,
    pub new_parent: Label,
    pub new_child: Label,
}

/// Rules grouped by parent label, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct BigramRules {
    by_parent: AHashMap<Label, Vec<BigramRule>>,
}

impl BigramRules {
    #[must_use]
    pub fn from_config(rules: &[BigramRuleConfig]) -> Self {
        let mut by_parent: AHashMap<Label, Vec<BigramRule>> = AHashMap::new();
        for rule in rules {
            by_parent
                .entry(rule.parent.clone())
                .or_default()
                .push(BigramRule {
                    child: rule.child.clone(),
                    mode: rule.mode,
                    new_parent: rule.new_parent.clone(),
                    new_child: rule.new_child.clone(),
                });
        }
        Self { by_parent }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }

    #[must_use]
    pub fn for_parent(&self, label: &Label) -> Option<&[BigramRule]> {
        self.by_parent.get(label).map(Vec::as_slice)
    }

    pub fn parents(&self) -> impl Iterator<Item = &Label> {
        self.by_parent.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::kind::Kind;

    #[test]
    fn test_legacy_mode_names_deserialize() {
        let json = r#"[
            {"parent": "paragraph", "child": "media_reference", "mode": "det_by_child",
             "new_parent": "media_content", "new_child": "paragraph"},
            {"parent": "paragraph", "child": "bold", "mode": "to_merge",
             "new_parent": "heading", "new_child": "unwrap"}
        ]"#;
        let parsed: Vec<BigramRuleConfig> = serde_json::from_str(json).expect("valid rules");
        let rules = BigramRules::from_config(&parsed);
        let for_p = rules
            .for_parent(&Label::Kind(Kind::Paragraph))
            .expect("rules for paragraph");
        assert_eq!(for_p.len(), 2);
        assert_eq!(for_p[0].mode, BigramMode::OwnText);
        assert_eq!(for_p[1].new_child, Label::Kind(Kind::ToUnwrap));
    }
}
