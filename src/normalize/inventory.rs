//! Tag inventory: draft dictionary tables for a new portal
//!
//! Walks imported (not yet normalized) article bodies and aggregates per
//! signature statistics. The output tables use the dictionary column layout
//! with placeholder normal names, ready for a curator to fill in.

use ahash::AHashMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::dictionary::DICTIONARY_COLUMNS;
use super::{TagSignature, signature_of};
use crate::config::CompiledPortal;
use crate::tree::DocTree;
use crate::utils::INVENTORY_EXAMPLE_URLS;

const HEADER: [&str; DICTIONARY_COLUMNS] = [
    "frequency",
    "tag",
    "average_word_count",
    "average_descendant_num",
    "immediate_texts_average_length",
    "URL_example",
    "normal_name",
    "preserved_attribute",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TagStats {
    frequency: usize,
    words: usize,
    descendants: usize,
    immediate_words: usize,
    urls: BTreeSet<String>,
}

impl TagStats {
    fn absorb(&mut self, other: TagStats) {
        self.frequency += other.frequency;
        self.words += other.words;
        self.descendants += other.descendants;
        self.immediate_words += other.immediate_words;
        self.urls.extend(other.urls);
    }

    fn average(&self, total: usize) -> f64 {
        total as f64 / self.frequency.max(1) as f64
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub frequency: usize,
    pub signature: TagSignature,
    pub average_words: f64,
    pub average_descendants: f64,
    pub average_immediate_words: f64,
    pub example_urls: Vec<String>,
}

impl InventoryRow {
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.average_words > 0.0
    }

    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        let normal_name = if self.has_text() { "default" } else { "null" };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\tdefault",
            self.frequency,
            self.signature,
            self.average_words,
            self.average_descendants,
            self.average_immediate_words,
            self.example_urls.join(" "),
            normal_name,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagInventory {
    tags: AHashMap<TagSignature, TagStats>,
    articles: usize,
}

impl TagInventory {
    /// Add every element of an imported article body.
    pub fn record_article(&mut self, doc: &DocTree, portal: &CompiledPortal, url: &str) {
        self.articles += 1;
        for id in doc.descendant_elements(doc.root()) {
            let Some(signature) = signature_of(doc, id, portal) else {
                continue;
            };
            let stats = self.tags.entry(signature).or_default();
            stats.frequency += 1;
            stats.words += doc.text(id).split_whitespace().count();
            stats.descendants += doc.descendant_elements(id).len();
            stats.immediate_words += doc.immediate_words(id);
            stats.urls.insert(url.to_string());
        }
    }

    /// Combine two partial inventories, e.g. from parallel workers.
    #[must_use]
    pub fn merge(mut self, other: TagInventory) -> TagInventory {
        self.articles += other.articles;
        for (signature, stats) in other.tags {
            self.tags.entry(signature).or_default().absorb(stats);
        }
        self
    }

    #[must_use]
    pub fn articles(&self) -> usize {
        self.articles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Rows ordered by decreasing frequency, then by signature.
    #[must_use]
    pub fn rows(&self) -> Vec<InventoryRow> {
        let mut rows: Vec<InventoryRow> = self
            .tags
            .iter()
            .map(|(signature, stats)| InventoryRow {
                frequency: stats.frequency,
                signature: signature.clone(),
                average_words: stats.average(stats.words),
                average_descendants: stats.average(stats.descendants),
                average_immediate_words: stats.average(stats.immediate_words),
                example_urls: stats
                    .urls
                    .iter()
                    .take(INVENTORY_EXAMPLE_URLS)
                    .cloned()
                    .collect(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.signature.cmp(&b.signature))
        });
        rows
    }

    /// Write `{portal}_text_tags_normal.tsv` and `{portal}_notext_tags_normal.tsv`.
    pub fn write_tables(&self, dir: &Path, portal: &str) -> std::io::Result<(PathBuf, PathBuf)> {
        let text_path = dir.join(format!("{portal}_text_tags_normal.tsv"));
        let notext_path = dir.join(format!("{portal}_notext_tags_normal.tsv"));
        let mut text_out = BufWriter::new(File::create(&text_path)?);
        let mut notext_out = BufWriter::new(File::create(&notext_path)?);
        writeln!(text_out, "{}", HEADER.join("\t"))?;
        writeln!(notext_out, "{}", HEADER.join("\t"))?;

        for row in self.rows() {
            if row.has_text() {
                row.write_to(&mut text_out)?;
            } else {
                row.write_to(&mut notext_out)?;
            }
        }
        text_out.flush()?;
        notext_out.flush()?;
        Ok((text_path, notext_path))
    }
}
