//! Persisting converted documents
//!
//! All writers are owned by a single thread. [`DocumentSink`] routes each
//! finished article to the archive, the quarantine directory or the debug
//! directory and keeps the URL lists up to date.

pub mod archive;
pub mod collision;
pub mod digest;
pub mod errors;
pub mod readable;
pub mod url_log;

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use tracing::{error, warn};
use uuid::Uuid;

pub use archive::{ArchiveWriter, QuarantineDir};
pub use collision::NameRegistry;
pub use digest::{DigestAlgorithm, digest_all};
pub use errors::WriteError;
pub use readable::{DebugWriter, readable_stem};
pub use url_log::UrlLog;

use crate::config::{OutputMode, RunConfig};
use crate::schema::ValidationError;

/// A serialized document ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub pid: Uuid,
    pub url: String,
    pub published: Option<DateTime<FixedOffset>>,
    pub bytes: Vec<u8>,
}

/// Validation result attached to a document in archive mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(ValidationError),
    /// Debug mode does not validate
    Unchecked,
}

/// Where a document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Archived(String),
    Quarantined(PathBuf),
    Debug(PathBuf),
}

enum Target {
    Archive(ArchiveWriter),
    Debug(DebugWriter),
}

pub struct DocumentSink {
    target: Target,
    urls: UrlLog,
}

impl DocumentSink {
    /// Open the writers selected by the run's output mode.
    pub fn open(config: &RunConfig) -> Result<Self, WriteError> {
        let limit = config.portal().thresholds.collision_limit;
        let target = match config.mode() {
            OutputMode::Archive => Target::Archive(ArchiveWriter::create(
                &config.archive_path(),
                &config.hashsums_path(),
                &config.quarantine_dir(),
                config.digests(),
                limit,
            )?),
            OutputMode::Debug => {
                Target::Debug(DebugWriter::create(&config.quarantine_dir(), limit)?)
            }
        };
        Ok(Self {
            target,
            urls: UrlLog::create(config.log_dir(), config.portal_name())?,
        })
    }

    pub fn write(
        &mut self,
        document: &OutputDocument,
        verdict: &Verdict,
    ) -> Result<Placement, WriteError> {
        let placement = match (&mut self.target, verdict) {
            (Target::Debug(writer), _) => Placement::Debug(writer.write(document)?),
            (Target::Archive(writer), Verdict::Valid | Verdict::Unchecked) => {
                Placement::Archived(writer.archive(document)?)
            }
            (Target::Archive(writer), Verdict::Invalid(reason)) => {
                error!(
                    url = %document.url,
                    pid = %document.pid,
                    error = %reason,
                    "document failed validation, quarantined"
                );
                Placement::Quarantined(writer.quarantine(document)?)
            }
        };
        match &placement {
            Placement::Quarantined(_) => self.urls.rejected(&document.url, "not valid")?,
            Placement::Archived(_) | Placement::Debug(_) => self.urls.converted(&document.url)?,
        }
        Ok(placement)
    }

    /// Record an article that produced no document.
    pub fn skipped(&mut self, url: &str, reason: &str) -> Result<(), WriteError> {
        warn!(url, reason, "article skipped");
        self.urls.rejected(url, reason)
    }

    pub fn finish(mut self) -> Result<(), WriteError> {
        self.urls.flush()?;
        match self.target {
            Target::Archive(writer) => writer.finish(),
            Target::Debug(_) => Ok(()),
        }
    }
}
