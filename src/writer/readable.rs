//! Debug output: every document under a name derived from its URL

use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use super::OutputDocument;
use super::archive::QuarantineDir;
use super::errors::WriteError;
use crate::utils::READABLE_NAME_MAX;

/// Filename stem from the last non-empty path segment of `url`.
#[must_use]
pub fn readable_stem(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        let last = parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string));
        last.or_else(|| parsed.host_str().map(str::to_string))
    });
    let raw = segment.unwrap_or_else(|| url.to_string());
    let raw = raw
        .strip_suffix(".html")
        .or_else(|| raw.strip_suffix(".htm"))
        .unwrap_or(&raw);

    let slug: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(READABLE_NAME_MAX)
        .collect();
    if slug.is_empty() { "article".to_string() } else { slug }
}

/// Writes unvalidated documents into one directory.
pub struct DebugWriter {
    dir: QuarantineDir,
}

impl DebugWriter {
    pub fn create(dir: &Path, collision_limit: usize) -> Result<Self, WriteError> {
        Ok(Self {
            dir: QuarantineDir::create(dir, collision_limit)?,
        })
    }

    pub fn write(&mut self, document: &OutputDocument) -> Result<PathBuf, WriteError> {
        let path = self.dir.write(&readable_stem(&document.url), &document.bytes)?;
        debug!(url = %document.url, path = %path.display(), "debug document written");
        Ok(path)
    }
}
