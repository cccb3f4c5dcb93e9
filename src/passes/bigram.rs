//! Relabelling by configured parent/descendant label pairs

use ahash::AHashSet;
use ego_tree::NodeId;
use tracing::debug;

use crate::rules::{BigramMode, BigramRule, BigramRules};
use crate::tree::{DocTree, Label};

struct LabelShape {
    naked_text: bool,
    children: AHashSet<Label>,
    descendants: AHashSet<Label>,
}

impl LabelShape {
    fn of(doc: &DocTree, id: NodeId) -> Self {
        let labels = |ids: Vec<NodeId>| -> AHashSet<Label> {
            ids.into_iter()
                .filter_map(|c| doc.label(c).cloned())
                .collect()
        };
        Self {
            naked_text: doc.immediate_words(id) > 0,
            children: labels(doc.element_children(id)),
            descendants: labels(doc.descendant_elements(id)),
        }
    }

    fn fires(&self, rule: &BigramRule) -> Option<bool> {
        if rule.mode == BigramMode::AnyDescendant && self.descendants.contains(&rule.child) {
            return Some(true);
        }
        let only_child = self.children.len() == 1;
        let direct = self.children.contains(&rule.child)
            && match rule.mode {
                BigramMode::AnyChild => true,
                BigramMode::OwnText => only_child,
                BigramMode::Merge => only_child && !self.naked_text,
                BigramMode::AnyDescendant => false,
            };
        direct.then_some(false)
    }
}

/// Apply bigram rules innermost first; at most one rule fires per parent.
pub fn rename_by_bigram_rules(doc: &mut DocTree, rules: &BigramRules, url: &str) {
    if rules.is_empty() {
        return;
    }
    debug!(url, "renaming by bigram rules");

    let parents: Vec<NodeId> = doc
        .descendant_elements(doc.root())
        .into_iter()
        .filter(|id| doc.label(*id).is_some_and(|l| rules.for_parent(l).is_some()))
        .collect();

    for parent in parents.into_iter().rev() {
        let Some(label) = doc.label(parent).cloned() else {
            continue;
        };
        let Some(candidates) = rules.for_parent(&label) else {
            continue;
        };
        let shape = LabelShape::of(doc, parent);
        if !candidates
            .iter()
            .any(|rule| shape.descendants.contains(&rule.child))
        {
            continue;
        }

        for rule in candidates {
            let Some(anywhere) = shape.fires(rule) else {
                continue;
            };
            let matched: Vec<NodeId> = if anywhere {
                doc.descendant_elements(parent)
            } else {
                doc.element_children(parent)
            }
            .into_iter()
            .filter(|id| doc.label(*id) == Some(&rule.child))
            .collect();
            for id in matched {
                doc.set_label(id, rule.new_child.clone());
            }
            doc.set_label(parent, rule.new_parent.clone());
            break;
        }
    }
}
