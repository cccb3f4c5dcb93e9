//! Content-addressed zip archive, digest file and quarantine directory
//!
//! Valid documents are stored as `{date}/{pid}.xml` inside `{portal}.zip`
//! with one line per entry in `{portal}.hashsums`. Documents that failed
//! validation are written as plain files into `{portal}_not_valid/`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::OutputDocument;
use super::collision::NameRegistry;
use super::digest::{DigestAlgorithm, digest_all};
use super::errors::WriteError;
use crate::utils::UNKNOWN_DATE_DIR;

pub struct ArchiveWriter {
    archive_path: PathBuf,
    zip: ZipWriter<File>,
    options: SimpleFileOptions,
    hashsums_path: PathBuf,
    hashsums: BufWriter<File>,
    digests: Vec<DigestAlgorithm>,
    archive_names: NameRegistry,
    quarantine: QuarantineDir,
}

impl ArchiveWriter {
    /// Create the archive, the digest file (with its header) and the quarantine directory.
    pub fn create(
        archive_path: &Path,
        hashsums_path: &Path,
        quarantine_dir: &Path,
        digests: &[DigestAlgorithm],
        collision_limit: usize,
    ) -> Result<Self, WriteError> {
        if let Some(parent) = archive_path.parent() {
            fs::create_dir_all(parent).map_err(WriteError::io(parent))?;
        }
        let file = File::create(archive_path).map_err(WriteError::io(archive_path))?;
        let zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut hashsums = BufWriter::new(
            File::create(hashsums_path).map_err(WriteError::io(hashsums_path))?,
        );
        let columns: Vec<&str> = digests.iter().map(|d| d.name()).collect();
        writeln!(hashsums, "filename\turl\t{}", columns.join("\t"))
            .map_err(WriteError::io(hashsums_path))?;

        info!(archive = %archive_path.display(), "archive created");
        Ok(Self {
            archive_path: archive_path.to_path_buf(),
            zip,
            options,
            hashsums_path: hashsums_path.to_path_buf(),
            hashsums,
            digests: digests.to_vec(),
            archive_names: NameRegistry::new(collision_limit),
            quarantine: QuarantineDir::create(quarantine_dir, collision_limit)?,
        })
    }

    /// Store a valid document and record its digests. Returns the entry name.
    pub fn archive(&mut self, document: &OutputDocument) -> Result<String, WriteError> {
        let dir = document
            .published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE_DIR.to_string());
        let stem = format!("{dir}/{}", document.pid);
        let name = self.archive_names.claim(&stem, ".xml", |_| false)?;

        self.zip.start_file(name.as_str(), self.options)?;
        self.zip
            .write_all(&document.bytes)
            .map_err(WriteError::io(&self.archive_path))?;

        let sums = digest_all(&self.digests, &document.bytes);
        writeln!(self.hashsums, "{name}\t{}\t{}", document.url, sums.join("\t"))
            .map_err(WriteError::io(&self.hashsums_path))?;
        debug!(url = %document.url, entry = %name, "document archived");
        Ok(name)
    }

    /// Store a document that failed validation.
    pub fn quarantine(&mut self, document: &OutputDocument) -> Result<PathBuf, WriteError> {
        self.quarantine
            .write(&document.pid.to_string(), &document.bytes)
    }

    /// Number of documents stored in the archive so far.
    #[must_use]
    pub fn archived(&self) -> usize {
        self.archive_names.len()
    }

    /// Write the zip central directory and flush the digest file.
    pub fn finish(mut self) -> Result<(), WriteError> {
        self.zip.finish()?;
        self.hashsums
            .flush()
            .map_err(WriteError::io(&self.hashsums_path))?;
        info!(archive = %self.archive_path.display(), "archive closed");
        Ok(())
    }
}

/// Plain directory of `.xml` files with collision-safe names.
pub struct QuarantineDir {
    dir: PathBuf,
    names: NameRegistry,
}

impl QuarantineDir {
    pub fn create(dir: &Path, collision_limit: usize) -> Result<Self, WriteError> {
        fs::create_dir_all(dir).map_err(WriteError::io(dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            names: NameRegistry::new(collision_limit),
        })
    }

    /// Write `bytes` as `{stem}.xml` (suffixed on collision) through a temp file.
    pub fn write(&mut self, stem: &str, bytes: &[u8]) -> Result<PathBuf, WriteError> {
        let dir = &self.dir;
        let name = self
            .names
            .claim(stem, ".xml", |name| dir.join(name).exists())?;
        let path = self.dir.join(name);

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(WriteError::io(&self.dir))?;
        temp.write_all(bytes).map_err(WriteError::io(&path))?;
        temp.persist(&path)
            .map_err(|e| WriteError::io(&path)(e.error))?;
        Ok(path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::io::Read;
    use uuid::Uuid;

    fn document(url: &str, published: Option<&str>) -> OutputDocument {
        OutputDocument {
            pid: Uuid::from_u128(7),
            url: url.to_string(),
            published: published.map(|d| DateTime::parse_from_rfc3339(d).expect("valid date")),
            bytes: b"<TEI/>".to_vec(),
        }
    }

    #[test]
    fn test_archive_entries_and_hashsums() {
        let dir = tempfile::tempdir().expect("temp dir");
        let archive_path = dir.path().join("demo.zip");
        let hashsums_path = dir.path().join("demo.hashsums");
        let mut writer = ArchiveWriter::create(
            &archive_path,
            &hashsums_path,
            &dir.path().join("demo_not_valid"),
            &DigestAlgorithm::ALL,
            100,
        )
        .expect("writer");

        let dated = document("https://demo.hu/a", Some("2021-03-04T10:00:00+01:00"));
        let first = writer.archive(&dated).expect("archived");
        let second = writer.archive(&dated).expect("archived again");
        let undated = writer.archive(&document("https://demo.hu/b", None)).expect("archived");
        assert_eq!(first, format!("2021-03-04/{}.xml", Uuid::from_u128(7)));
        assert_eq!(second, format!("2021-03-04/{}_1.xml", Uuid::from_u128(7)));
        assert!(undated.starts_with("unknown_date/"));
        assert_eq!(writer.archived(), 3);
        writer.finish().expect("finish");

        let mut zip = zip::ZipArchive::new(File::open(&archive_path).expect("zip")).expect("readable zip");
        assert_eq!(zip.len(), 3);
        let mut content = String::new();
        zip.by_name(&second)
            .expect("entry")
            .read_to_string(&mut content)
            .expect("read entry");
        assert_eq!(content, "<TEI/>");

        let sums = fs::read_to_string(&hashsums_path).expect("hashsums");
        let lines: Vec<&str> = sums.lines().collect();
        assert_eq!(lines[0], "filename\turl\tsha256\tsha512\txxh3_64\txxh3_128");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with(&format!("{first}\thttps://demo.hu/a\t")));
        assert_eq!(lines[1].split('\t').count(), 6);
    }

    #[test]
    fn test_quarantine_never_overwrites() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut quarantine = QuarantineDir::create(&dir.path().join("q"), 100).expect("dir");
        fs::write(dir.path().join("q/x.xml"), "old").expect("pre-existing file");

        let path = quarantine.write("x", b"new").expect("written");
        assert_eq!(path, dir.path().join("q/x_1.xml"));
        assert_eq!(fs::read_to_string(dir.path().join("q/x.xml")).expect("old"), "old");
        assert_eq!(fs::read_to_string(path).expect("new"), "new");
    }
}
