//! Getter methods for `RunConfig`

use chrono::{DateTime, FixedOffset};
use std::path::Path;

use super::loader::CompiledPortal;
use super::types::{OutputMode, RunConfig};
use crate::schema::Grammar;
use crate::writer::DigestAlgorithm;

impl RunConfig {
    #[must_use]
    pub fn portal(&self) -> &CompiledPortal {
        &self.portal
    }

    #[must_use]
    pub fn portal_name(&self) -> &str {
        &self.portal.name
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub fn sequential(&self) -> bool {
        self.sequential
    }

    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    #[must_use]
    pub fn digests(&self) -> &[DigestAlgorithm] {
        &self.digests
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn processed_at(&self) -> DateTime<FixedOffset> {
        self.processed_at
    }

    /// `{output}/{portal}.zip`
    #[must_use]
    pub fn archive_path(&self) -> std::path::PathBuf {
        self.output_dir.join(format!("{}.zip", self.portal.name))
    }

    /// `{output}/{portal}.hashsums`
    #[must_use]
    pub fn hashsums_path(&self) -> std::path::PathBuf {
        self.output_dir.join(format!("{}.hashsums", self.portal.name))
    }

    /// `{output}/{portal}_not_valid`
    #[must_use]
    pub fn quarantine_dir(&self) -> std::path::PathBuf {
        self.output_dir.join(format!("{}_not_valid", self.portal.name))
    }
}
