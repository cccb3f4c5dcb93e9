//! `{portal}_urls.txt` and `{portal}_bad_urls.txt`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::errors::WriteError;

/// Lists of converted URLs and of URLs that did not make it to the archive.
pub struct UrlLog {
    good_path: PathBuf,
    good: BufWriter<File>,
    bad_path: PathBuf,
    bad: BufWriter<File>,
}

impl UrlLog {
    pub fn create(dir: &Path, portal: &str) -> Result<Self, WriteError> {
        fs::create_dir_all(dir).map_err(WriteError::io(dir))?;
        let open = |path: &PathBuf| -> Result<BufWriter<File>, WriteError> {
            Ok(BufWriter::new(File::create(path).map_err(WriteError::io(path))?))
        };
        let good_path = dir.join(format!("{portal}_urls.txt"));
        let bad_path = dir.join(format!("{portal}_bad_urls.txt"));
        Ok(Self {
            good: open(&good_path)?,
            bad: open(&bad_path)?,
            good_path,
            bad_path,
        })
    }

    pub fn converted(&mut self, url: &str) -> Result<(), WriteError> {
        writeln!(self.good, "{url}").map_err(WriteError::io(&self.good_path))
    }

    /// Record a URL with the reason it was not archived.
    pub fn rejected(&mut self, url: &str, reason: &str) -> Result<(), WriteError> {
        writeln!(self.bad, "{url}\t{reason}").map_err(WriteError::io(&self.bad_path))
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.good.flush().map_err(WriteError::io(&self.good_path))?;
        self.bad.flush().map_err(WriteError::io(&self.bad_path))
    }
}
