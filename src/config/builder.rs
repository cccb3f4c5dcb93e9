//! Type-safe builder for `RunConfig` using the typestate pattern
//!
//! The portal and the output directory are required; `build()` only exists
//! once both have been supplied.

use chrono::{DateTime, FixedOffset, Local};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use super::errors::ConfigError;
use super::loader::CompiledPortal;
use super::types::{OutputMode, RunConfig};
use crate::schema::Grammar;
use crate::utils::CHUNK_SIZE;
use crate::writer::DigestAlgorithm;

// Type states for the builder
pub struct WithPortal;
pub struct Complete;

pub struct RunConfigBuilder<State = ()> {
    pub(crate) portal: Option<Arc<CompiledPortal>>,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) log_dir: Option<PathBuf>,
    pub(crate) mode: OutputMode,
    pub(crate) sequential: bool,
    pub(crate) grammar: Option<Arc<Grammar>>,
    pub(crate) digests: Vec<DigestAlgorithm>,
    pub(crate) chunk_size: usize,
    pub(crate) processed_at: Option<DateTime<FixedOffset>>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for RunConfigBuilder<()> {
    fn default() -> Self {
        Self {
            portal: None,
            output_dir: None,
            log_dir: None,
            mode: OutputMode::Archive,
            sequential: false,
            grammar: None,
            digests: DigestAlgorithm::ALL.to_vec(),
            chunk_size: CHUNK_SIZE,
            processed_at: None,
            _phantom: PhantomData,
        }
    }
}

impl RunConfig {
    /// Create a builder for configuring a `RunConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> RunConfigBuilder<()> {
        RunConfigBuilder::default()
    }
}

impl<State> RunConfigBuilder<State> {
    fn transition<Next>(self) -> RunConfigBuilder<Next> {
        RunConfigBuilder {
            portal: self.portal,
            output_dir: self.output_dir,
            log_dir: self.log_dir,
            mode: self.mode,
            sequential: self.sequential,
            grammar: self.grammar,
            digests: self.digests,
            chunk_size: self.chunk_size,
            processed_at: self.processed_at,
            _phantom: PhantomData,
        }
    }

    /// Directory for `{portal}_urls.txt` and friends; defaults to the output directory
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Convert on the calling thread instead of the rayon pool
    #[must_use]
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Validate against a custom grammar instead of the bundled one
    #[must_use]
    pub fn grammar(mut self, grammar: Arc<Grammar>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    #[must_use]
    pub fn digests(mut self, digests: Vec<DigestAlgorithm>) -> Self {
        self.digests = digests;
        self
    }

    /// Number of articles converted in parallel before handing them to the writer
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Fix the conversion timestamp (useful for reproducible output)
    #[must_use]
    pub fn processed_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.processed_at = Some(at);
        self
    }
}

impl RunConfigBuilder<()> {
    pub fn portal(mut self, portal: impl Into<Arc<CompiledPortal>>) -> RunConfigBuilder<WithPortal> {
        self.portal = Some(portal.into());
        self.transition()
    }
}

impl RunConfigBuilder<WithPortal> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> RunConfigBuilder<Complete> {
        self.output_dir = Some(dir.into());
        self.transition()
    }
}

// Build method only available when all required fields are set
impl RunConfigBuilder<Complete> {
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let portal = self.portal.ok_or(ConfigError::Missing { field: "portal" })?;
        let output_dir = self
            .output_dir
            .ok_or(ConfigError::Missing { field: "output_dir" })?;
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_size",
                message: "must be at least 1".into(),
            });
        }
        if self.digests.is_empty() {
            return Err(ConfigError::Invalid {
                field: "digests",
                message: "at least one digest algorithm is required".into(),
            });
        }

        Ok(RunConfig {
            log_dir: self.log_dir.unwrap_or_else(|| output_dir.clone()),
            grammar: self.grammar.unwrap_or_else(Grammar::builtin),
            processed_at: self
                .processed_at
                .unwrap_or_else(|| Local::now().fixed_offset()),
            portal,
            output_dir,
            mode: self.mode,
            sequential: self.sequential,
            digests: self.digests,
            chunk_size: self.chunk_size,
        })
    }
}
