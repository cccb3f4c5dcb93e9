use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or compiling configuration.
///
/// All of them are fatal at startup; nothing in here is raised per article.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid portal configuration {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}: expected at least {expected} tab-separated columns, found {found}")]
    TsvShape {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("normalization dictionary is empty (checked {0:?})")]
    EmptyDictionary(Vec<PathBuf>),

    #[error("invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("invalid regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("block rules for '{0}' are configured but '{0}' is not a block kind")]
    NotABlock(String),

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
