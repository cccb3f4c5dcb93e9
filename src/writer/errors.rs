use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the output writers. Any of them stops the run.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("more than {limit} documents want the name '{name}'")]
    CollisionLimit { name: String, limit: usize },

    #[error("writer thread stopped unexpectedly")]
    Disconnected,
}

impl WriteError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> WriteError {
        let path = path.into();
        move |source| WriteError::Io { path, source }
    }
}
