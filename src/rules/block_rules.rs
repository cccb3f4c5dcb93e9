//! Per-block structural rules
//!
//! Each block kind names the child labels it renames, the wrapper used for
//! stray text and inline runs, and the block kinds it does not tolerate
//! inside it or around it.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tree::kind::{Kind, KindSet};
use crate::tree::node::Label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    /// Labels renamed below the block root, up to a nested block root
    pub rename: Vec<(Label, Label)>,
    /// Wrapper for naked text and inline runs directly under the root
    pub default_child: Kind,
    /// Blocks that are unwrapped when they occur inside this one
    pub forbidden_inner: KindSet,
    /// Blocks this one may not contain; the outer occurrence is dropped
    pub forbidden_outer: KindSet,
}

impl BlockRule {
    fn new(default_child: Kind) -> Self {
        Self {
            rename: Vec::new(),
            default_child,
            forbidden_inner: KindSet::EMPTY,
            forbidden_outer: KindSet::EMPTY,
        }
    }

    fn renames(mut self, pairs: &[(Kind, Kind)]) -> Self {
        self.rename = pairs
            .iter()
            .map(|(from, to)| (Label::Kind(*from), Label::Kind(*to)))
            .collect();
        self
    }

    fn inner(mut self, kinds: &[Kind]) -> Self {
        self.forbidden_inner = KindSet::of(kinds);
        self
    }

    fn outer(mut self, kinds: &[Kind]) -> Self {
        self.forbidden_outer = KindSet::of(kinds);
        self
    }

    #[must_use]
    pub fn renamed(&self, label: &Label) -> Option<&Label> {
        self.rename
            .iter()
            .find(|(from, _)| from == label)
            .map(|(_, to)| to)
    }
}

/// Portal-level override of one block rule; present fields replace the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockRuleOverride {
    #[serde(default)]
    pub rename: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub default: Option<Kind>,
    #[serde(default, alias = "not_valid_inner_blocks")]
    pub forbidden_inner: Option<Vec<Kind>>,
    #[serde(default, alias = "not_valid_as_outer_for")]
    pub forbidden_outer: Option<Vec<Kind>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRules {
    rules: AHashMap<Kind, BlockRule>,
}

impl Default for BlockRules {
    fn default() -> Self {
        use Kind::*;

        let mut rules = AHashMap::new();
        rules.insert(
            Quote,
            BlockRule::new(Paragraph)
                .renames(&[(Heading, Bold)])
                .outer(&[Quote, Box, Lead, Feed, Gallery, Quiz, Comment]),
        );
        rules.insert(
            Box,
            BlockRule::new(Paragraph)
                .renames(&[(Column, ToUnwrap), (Row, Paragraph), (ColumnRow, Paragraph)])
                .outer(&[Feed, Lead, Comment]),
        );
        rules.insert(
            List,
            BlockRule::new(ListItem).inner(&[Box]).outer(&[Feed, Lead]),
        );
        rules.insert(
            Lead,
            BlockRule::new(Paragraph)
                .renames(&[(Heading, Bold)])
                .inner(&[Box])
                .outer(&[Comment]),
        );
        rules.insert(
            Table,
            BlockRule::new(ColumnRow)
                .renames(&[(Column, ColumnValid), (Row, RowValid)])
                .inner(&[Box])
                .outer(&[Comment]),
        );
        rules.insert(
            Feed,
            BlockRule::new(Paragraph)
                .renames(&[(Paragraph, ToUnwrap)])
                .inner(&[Box]),
        );
        rules.insert(
            Gallery,
            BlockRule::new(Paragraph).outer(&[Box, Table, List, Feed, Lead]),
        );
        rules.insert(
            Quiz,
            BlockRule::new(Paragraph)
                .inner(&[Box, Table, Feed, Lead])
                .outer(&[Feed, Lead]),
        );
        rules.insert(Comment, BlockRule::new(Paragraph).inner(&[Comment]));
        Self { rules }
    }
}

impl BlockRules {
    #[must_use]
    pub fn get(&self, kind: Kind) -> Option<&BlockRule> {
        self.rules.get(&kind)
    }

    /// Apply a portal override on top of the rule for `kind`.
    ///
    /// Returns `false` when `kind` is not a block.
    pub fn merge(&mut self, kind: Kind, patch: &BlockRuleOverride) -> bool {
        let Some(rule) = self.rules.get_mut(&kind) else {
            return false;
        };
        if let Some(rename) = &patch.rename {
            rule.rename = rename
                .iter()
                .map(|(from, to)| (Label::parse(from), Label::parse(to)))
                .collect();
        }
        if let Some(default) = patch.default {
            rule.default_child = default;
        }
        if let Some(inner) = &patch.forbidden_inner {
            rule.forbidden_inner = inner.iter().copied().collect();
        }
        if let Some(outer) = &patch.forbidden_outer {
            rule.forbidden_outer = outer.iter().copied().collect();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_block_has_a_rule() {
        let rules = BlockRules::default();
        for kind in crate::tree::kind::BLOCKS.iter() {
            assert!(rules.get(kind).is_some(), "missing rule for {kind}");
        }
    }

    #[test]
    fn test_table_renames_cells() {
        let rules = BlockRules::default();
        let table = rules.get(Kind::Table).map(|r| r.renamed(&Label::Kind(Kind::Column)).cloned());
        assert_eq!(table, Some(Some(Label::Kind(Kind::ColumnValid))));
    }

    #[test]
    fn test_merge_replaces_only_given_keys() {
        let mut rules = BlockRules::default();
        let patch: BlockRuleOverride =
            serde_json::from_str(r#"{"not_valid_inner_blocks": ["table"]}"#).unwrap_or_default();
        assert!(rules.merge(Kind::List, &patch));
        let list = rules.get(Kind::List).cloned();
        assert_eq!(
            list.as_ref().map(|r| r.forbidden_inner),
            Some(KindSet::of(&[Kind::Table]))
        );
        assert_eq!(list.map(|r| r.default_child), Some(Kind::ListItem));
        assert!(!rules.merge(Kind::Paragraph, &patch));
    }
}
