//! Loading and compiling portal configuration
//!
//! The JSON file is deserialized into [`PortalConfig`], then every selector
//! and regex is compiled once and the dictionary tables are read, giving a
//! read-only [`CompiledPortal`] shared by all workers.

use ahash::AHashSet;
use regex::Regex;
use scraper::Selector;
use std::path::{Path, PathBuf};
use tracing::info;

use super::errors::ConfigError;
use super::types::{PortalConfig, Thresholds};
use crate::normalize::{AttributeFilter, ConfiguredExclusions, Dictionary};
use crate::rules::{BigramRules, BlockRules};

/// Portal configuration with selectors, patterns and tables compiled.
#[derive(Debug)]
pub struct CompiledPortal {
    pub name: String,
    pub url_prefix: String,
    pub publisher: String,
    pub link_reject: Option<Regex>,
    pub article_roots: Vec<Selector>,
    pub decompose: Vec<Selector>,
    pub media_roots: Vec<Selector>,
    pub link_tags: AHashSet<String>,
    pub attribute_filter: Box<dyn AttributeFilter>,
    pub dictionary: Dictionary,
    pub block_rules: BlockRules,
    pub bigram_rules: BigramRules,
    pub thresholds: Thresholds,
    pub strict_dictionary: bool,
}

fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| ConfigError::Selector {
                selector: s.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

impl PortalConfig {
    /// Read a portal JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compile the configuration, reading dictionary tables relative to `base_dir`.
    pub fn compile(self, base_dir: &Path) -> Result<CompiledPortal, ConfigError> {
        let paths: Vec<PathBuf> = self
            .dictionary_paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { base_dir.join(p) })
            .collect();
        let dictionary = Dictionary::load(&paths)?;
        info!(
            portal = %self.portal_name,
            entries = dictionary.len(),
            "normalization dictionary loaded"
        );
        self.compile_with_dictionary(dictionary)
    }

    /// Compile with an already built dictionary.
    pub fn compile_with_dictionary(
        self,
        dictionary: Dictionary,
    ) -> Result<CompiledPortal, ConfigError> {
        if dictionary.is_empty() {
            return Err(ConfigError::EmptyDictionary(self.dictionary_paths.clone()));
        }
        if self.article_roots.is_empty() {
            return Err(ConfigError::Missing {
                field: "article_roots",
            });
        }

        let link_reject = self
            .link_reject_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Regex {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut block_rules = BlockRules::default();
        for (kind, patch) in &self.block_rules {
            if !block_rules.merge(*kind, patch) {
                return Err(ConfigError::NotABlock(kind.to_string()));
            }
        }

        Ok(CompiledPortal {
            publisher: self
                .publisher
                .clone()
                .unwrap_or_else(|| self.portal_name.clone()),
            article_roots: compile_selectors(&self.article_roots)?,
            decompose: compile_selectors(&self.decompose)?,
            media_roots: compile_selectors(&self.media_roots)?,
            link_tags: self.link_tags.iter().cloned().collect(),
            attribute_filter: Box::new(ConfiguredExclusions::new(self.attribute_exclusions)),
            bigram_rules: BigramRules::from_config(&self.bigram_rules),
            block_rules,
            dictionary,
            link_reject,
            thresholds: self.thresholds,
            strict_dictionary: self.strict_dictionary,
            url_prefix: self.url_prefix,
            name: self.portal_name,
        })
    }
}

/// Load and compile `{portal}.json`.
pub fn load_portal(path: &Path) -> Result<CompiledPortal, ConfigError> {
    let config = PortalConfig::from_path(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.compile(base_dir)
}
