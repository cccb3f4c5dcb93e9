//! `tracing` subscriber setup for the binary and integration tests
//!
//! Events go to stderr and, when a log directory is given, also to
//! `tei_writing_{portal}.log` in that directory. Only the first call
//! installs the subscriber; later calls return the path chosen then.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info";

static LOG_FILE: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Name of the per-portal log file.
#[must_use]
pub fn log_file_name(portal: &str) -> String {
    format!("tei_writing_{portal}.log")
}

/// Install the global subscriber. `level` takes precedence over `RUST_LOG`.
pub fn init_logging(
    level: Option<&str>,
    log_dir: Option<&Path>,
    portal: &str,
) -> std::io::Result<Option<PathBuf>> {
    if let Some(path) = LOG_FILE.get() {
        return Ok(path.clone());
    }

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let path = log_dir.map(|dir| dir.join(log_file_name(portal)));
    let file_layer = match &path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    // Another subscriber (e.g. a test harness) may already be installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    let _ = LOG_FILE.set(path.clone());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_created_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = init_logging(Some("debug"), Some(dir.path()), "demo").expect("logging set up");
        assert_eq!(first.as_deref(), Some(dir.path().join("tei_writing_demo.log").as_path()));
        assert!(dir.path().join(log_file_name("demo")).is_file());

        let second = init_logging(None, None, "other").expect("second call is a no-op");
        assert_eq!(second, first);
    }
}
