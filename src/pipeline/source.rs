//! JSON-lines input: one article (single page or several pages) per line

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid article record: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}: multi-page record without pages")]
    NoPages { path: PathBuf, line: usize },
}

/// Article metadata extracted upstream. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleMeta {
    pub title: Option<String>,
    pub alternate_title: Option<String>,
    pub authors: Vec<String>,
    pub published: Option<DateTime<FixedOffset>>,
    pub modified: Option<DateTime<FixedOffset>>,
    pub section: Option<String>,
    pub keywords: Vec<String>,
    /// Agencies or outlets credited as sources
    pub sources: Vec<String>,
    pub extra: BTreeMap<String, String>,
}

/// One crawled page of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub crawl_timestamp: DateTime<FixedOffset>,
    pub record_id: String,
    pub html: String,
    #[serde(default)]
    pub meta: ArticleMeta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Record {
    MultiPage { pages: Vec<Page> },
    SinglePage(Page),
}

/// An article as read from the input, with its pages in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArticle {
    /// 1-based input line
    pub line: usize,
    pub pages: Vec<Page>,
}

impl SourceArticle {
    /// The page that names the article: URL, crawl time and record id.
    #[must_use]
    pub fn first_page(&self) -> &Page {
        // Constructed only with at least one page.
        &self.pages[0]
    }

    #[must_use]
    pub fn is_multipage(&self) -> bool {
        self.pages.len() > 1
    }
}

/// Iterator over the articles of a JSON-lines file. Blank lines are skipped;
/// a bad line yields an error and reading continues with the next one.
pub struct JsonlSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl JsonlSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }

    fn parse(&self, text: &str) -> Result<SourceArticle, SourceError> {
        let record: Record = serde_json::from_str(text).map_err(|source| SourceError::Json {
            path: self.path.clone(),
            line: self.line,
            source,
        })?;
        let pages = match record {
            Record::SinglePage(page) => vec![page],
            Record::MultiPage { pages } if !pages.is_empty() => pages,
            Record::MultiPage { .. } => {
                return Err(SourceError::NoPages {
                    path: self.path.clone(),
                    line: self.line,
                });
            }
        };
        Ok(SourceArticle {
            line: self.line,
            pages,
        })
    }
}

impl Iterator for JsonlSource {
    type Item = Result<SourceArticle, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(source) => {
                    self.line += 1;
                    return Some(Err(SourceError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.parse(&text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    const PAGE: &str = r#"{"url": "https://example.hu/a", "crawl_timestamp": "2021-03-04T10:00:00+01:00",
        "record_id": "<urn:uuid:1>", "html": "<article>x</article>",
        "meta": {"title": "Cím", "authors": ["Kiss Anna"], "published": "2021-03-03T08:00:00+01:00"}}"#;

    #[test]
    fn test_single_and_multi_page_lines() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.child("in.jsonl");
        let single = PAGE.replace('\n', " ");
        let multi = format!(r#"{{"pages": [{single}, {single}]}}"#);
        input
            .write_str(&format!("{single}\n\n{multi}\nnot json\n"))
            .expect("write");

        let articles: Vec<_> = JsonlSource::open(input.path()).expect("open").collect();
        assert_eq!(articles.len(), 3);

        let first = articles[0].as_ref().expect("single page");
        assert_eq!(first.line, 1);
        assert!(!first.is_multipage());
        assert_eq!(first.first_page().meta.title.as_deref(), Some("Cím"));
        assert_eq!(first.first_page().meta.authors, ["Kiss Anna"]);

        let second = articles[1].as_ref().expect("multi page");
        assert_eq!(second.line, 3);
        assert!(second.is_multipage());

        assert!(matches!(articles[2], Err(SourceError::Json { line: 4, .. })));
    }

    #[test]
    fn test_empty_page_list_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let input = dir.child("in.jsonl");
        input.write_str("{\"pages\": []}\n").expect("write");
        let mut source = JsonlSource::open(input.path()).expect("open");
        assert!(matches!(source.next(), Some(Err(SourceError::NoPages { line: 1, .. }))));
        assert!(source.next().is_none());
    }
}
