//! Structural rule sets: per-block rules and bigram rules

pub mod bigram;
pub mod block_rules;

pub use bigram::{BigramMode, BigramRule, BigramRuleConfig, BigramRules};
pub use block_rules::{BlockRule, BlockRuleOverride, BlockRules};
