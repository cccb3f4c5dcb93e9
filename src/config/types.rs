//! Core configuration types
//!
//! [`PortalConfig`] is the on-disk JSON description of one news portal.
//! [`RunConfig`] holds the per-run settings assembled by the CLI or by
//! library callers through [`RunConfig::builder`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::loader::CompiledPortal;
use crate::normalize::AttributeExclusion;
use crate::rules::{BigramRuleConfig, BlockRuleOverride};
use crate::schema::Grammar;
use crate::tree::kind::Kind;
use crate::utils::{
    COLLISION_LIMIT, ESCAPED_AACUTE_COUNT, LONG_ATTRIBUTE_VALUE, MEANINGFUL_ALPHA_RUN,
    UNICODE_ESCAPE_DENSITY,
};
use crate::writer::DigestAlgorithm;

/// Calibration thresholds, overridable per portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub unicode_escape_density: usize,
    pub escaped_aacute_count: usize,
    pub long_attribute_value: usize,
    pub meaningful_alpha_run: usize,
    pub collision_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            unicode_escape_density: UNICODE_ESCAPE_DENSITY,
            escaped_aacute_count: ESCAPED_AACUTE_COUNT,
            long_attribute_value: LONG_ATTRIBUTE_VALUE,
            meaningful_alpha_run: MEANINGFUL_ALPHA_RUN,
            collision_limit: COLLISION_LIMIT,
        }
    }
}

fn default_link_tags() -> Vec<String> {
    ["a", "img", "iframe"]
        .iter()
        .flat_map(|t| [(*t).to_string(), format!("{}{t}", crate::utils::MEDIA_DESCENDANT_PREFIX)])
        .collect()
}

/// Portal description as stored in `{portal}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    pub portal_name: String,
    /// Prepended to site-relative links
    pub url_prefix: String,
    /// Links matching this regex at their start are rejected
    #[serde(default)]
    pub link_reject_pattern: Option<String>,
    /// CSS selectors tried in order to find the article body
    pub article_roots: Vec<String>,
    /// CSS selectors of subtrees deleted before anything else
    #[serde(default)]
    pub decompose: Vec<String>,
    /// CSS selectors of media blocks whose descendants are marked
    #[serde(default)]
    pub media_roots: Vec<String>,
    /// HTML names whose attributes survive freezing (link carriers)
    #[serde(default = "default_link_tags")]
    pub link_tags: Vec<String>,
    #[serde(default)]
    pub attribute_exclusions: Vec<AttributeExclusion>,
    /// Dictionary TSV tables, relative to the configuration file
    pub dictionary_paths: Vec<PathBuf>,
    #[serde(default)]
    pub block_rules: BTreeMap<Kind, BlockRuleOverride>,
    #[serde(default)]
    pub bigram_rules: Vec<BigramRuleConfig>,
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Abort before converting when any input signature is missing
    #[serde(default)]
    pub strict_dictionary: bool,
    #[serde(default)]
    pub publisher: Option<String>,
}

/// How converted documents are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Validate; valid documents go to the zip archive, others to quarantine
    #[default]
    Archive,
    /// No validation; every document is written under a readable name
    Debug,
}

/// Settings of one conversion or inventory run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub(crate) portal: Arc<CompiledPortal>,
    pub(crate) output_dir: PathBuf,
    pub(crate) log_dir: PathBuf,
    pub(crate) mode: OutputMode,
    pub(crate) sequential: bool,
    pub(crate) grammar: Arc<Grammar>,
    pub(crate) digests: Vec<DigestAlgorithm>,
    pub(crate) chunk_size: usize,
    /// Conversion timestamp written into every revision description
    pub(crate) processed_at: DateTime<FixedOffset>,
}
