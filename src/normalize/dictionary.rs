//! Normalization dictionary loaded from curated TSV tables
//!
//! Column layout (shared with the tag inventory output):
//! frequency, frozen signature, average text length, average descendant
//! count, average immediate text length, example URLs, normal name,
//! preserved attribute.

use ahash::AHashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::signature::TagSignature;
use crate::config::ConfigError;
use crate::tree::kind::{BLOCKS, Kind};
use crate::tree::node::Label;

pub const DICTIONARY_COLUMNS: usize = 8;
pub const SIGNATURE_COLUMN: usize = 1;
pub const NORMAL_NAME_COLUMN: usize = 6;
pub const PRESERVED_ATTRIBUTE_COLUMN: usize = 7;

/// Attribute carried over when an element is renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preserve {
    /// Keep a short language code as `xml:lang`, if the element has one
    Language,
    /// Keep the value of this key as `target`
    Key(String),
}

impl Preserve {
    fn parse(column: &str) -> Self {
        match column.trim() {
            "" | "default" => Preserve::Language,
            key => Preserve::Key(key.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictAction {
    Unwrap,
    Decompose,
    /// `inner;outer`: rename to `inner` and wrap in a new `outer`
    Wrap { inner: Label, outer: Label },
    /// Blocks and sections are renamed and lose every attribute
    Structural(Kind),
    Rename { label: Label, preserve: Preserve },
}

impl DictAction {
    #[must_use]
    pub fn parse(normal_name: &str, preserved: &str) -> Self {
        let name = normal_name.trim();
        if let Some((inner, outer)) = name.split_once(';') {
            return DictAction::Wrap {
                inner: Label::parse(inner),
                outer: Label::parse(outer),
            };
        }
        match Label::parse(name) {
            Label::Kind(Kind::ToUnwrap) => DictAction::Unwrap,
            Label::Kind(Kind::ToDecompose) => DictAction::Decompose,
            Label::Kind(kind) if BLOCKS.contains(kind) || kind == Kind::Section => {
                DictAction::Structural(kind)
            }
            label => DictAction::Rename {
                label,
                preserve: Preserve::parse(preserved),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: AHashMap<TagSignature, DictAction>,
}

impl Dictionary {
    /// Load and merge several TSV files; later files win on duplicate signatures.
    pub fn load(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut dictionary = Dictionary::default();
        for path in paths {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            dictionary.extend_from_tsv(&text, path)?;
            debug!(path = %path.display(), entries = dictionary.len(), "loaded dictionary table");
        }
        if dictionary.is_empty() {
            return Err(ConfigError::EmptyDictionary(paths.to_vec()));
        }
        Ok(dictionary)
    }

    /// Add the rows of one TSV table. Header and blank lines are skipped.
    pub fn extend_from_tsv(&mut self, text: &str, origin: &Path) -> Result<(), ConfigError> {
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
            if columns.len() < DICTIONARY_COLUMNS {
                return Err(ConfigError::TsvShape {
                    path: origin.to_path_buf(),
                    line: line_no + 1,
                    expected: DICTIONARY_COLUMNS,
                    found: columns.len(),
                });
            }
            let Ok(signature) = columns[SIGNATURE_COLUMN].parse::<TagSignature>() else {
                continue;
            };
            let action = DictAction::parse(
                columns[NORMAL_NAME_COLUMN],
                columns[PRESERVED_ATTRIBUTE_COLUMN],
            );
            self.entries.insert(signature, action);
        }
        Ok(())
    }

    pub fn insert(&mut self, signature: TagSignature, action: DictAction) {
        self.entries.insert(signature, action);
    }

    #[must_use]
    pub fn lookup(&self, signature: &TagSignature) -> Option<&DictAction> {
        self.entries.get(signature)
    }

    #[must_use]
    pub fn contains(&self, signature: &TagSignature) -> bool {
        self.entries.contains_key(signature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = "freq\ttag\tavg_text\tavg_desc\tavg_imtext\turls\tnormal\tattr\n\
        12\t<div class=x>\t10\t1\t3\thttps://a.example/\tbox\tdefault\n\
        40\t<b>\t2\t0\t2\thttps://a.example/\tbold\tdefault\n\
        7\t<a href=@LINK>\t2\t0\t2\thttps://a.example/\treference\thref\n\
        3\t<figure>\t0\t2\t0\thttps://a.example/\tmedia_content;gallery\t\n\
        9\t<script>\t0\t0\t0\thttps://a.example/\tdecompose\tdefault\n\
        5\t<span>\t1\t0\t1\thttps://a.example/\tnull\tdefault\n";

    fn sig(s: &str) -> TagSignature {
        s.parse().expect("valid signature")
    }

    #[test]
    fn test_actions_from_table() {
        let mut dict = Dictionary::default();
        dict.extend_from_tsv(TABLE, Path::new("t.tsv"))
            .expect("well-formed table");
        assert_eq!(dict.len(), 6);
        assert_eq!(
            dict.lookup(&sig("<div class=x>")),
            Some(&DictAction::Structural(Kind::Box))
        );
        assert_eq!(
            dict.lookup(&sig("<a href=@LINK>")),
            Some(&DictAction::Rename {
                label: Label::Kind(Kind::Reference),
                preserve: Preserve::Key("href".into()),
            })
        );
        assert_eq!(
            dict.lookup(&sig("<figure>")),
            Some(&DictAction::Wrap {
                inner: Label::Kind(Kind::MediaContent),
                outer: Label::Kind(Kind::Gallery),
            })
        );
        assert_eq!(dict.lookup(&sig("<script>")), Some(&DictAction::Decompose));
        assert_eq!(dict.lookup(&sig("<span>")), Some(&DictAction::Unwrap));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let mut dict = Dictionary::default();
        let err = dict.extend_from_tsv("1\t<p>\tparagraph\n", Path::new("bad.tsv"));
        assert!(matches!(err, Err(ConfigError::TsvShape { line: 1, .. })));
    }

    #[test]
    fn test_empty_dictionary_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "freq\ttag\ta\tb\tc\td\tnormal\tattr").expect("write header");
        let err = Dictionary::load(&[file.path().to_path_buf()]);
        assert!(matches!(err, Err(ConfigError::EmptyDictionary(_))));
    }
}
