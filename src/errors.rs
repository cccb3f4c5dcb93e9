use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::source::SourceError;
use crate::schema::GrammarError;
use crate::writer::WriteError;

/// Errors that stop a conversion or inventory run.
///
/// Per-article problems never end up here: they are logged and counted in
/// the run summary.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{} tag signatures are missing from the dictionary, first: {}", .0.len(), .0.first().map(String::as_str).unwrap_or_default())]
    MissingSignatures(Vec<String>),

    #[error("failed to write inventory tables: {0}")]
    Inventory(#[source] std::io::Error),
}
