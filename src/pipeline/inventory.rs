//! Runs that only look at tag signatures: the tag inventory and the
//! dictionary coverage check

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::source::{JsonlSource, Page};
use crate::config::CompiledPortal;
use crate::errors::ConvertError;
use crate::normalize::inventory::TagInventory;
use crate::normalize::missing_signatures;
use crate::tree::import_article;
use crate::utils::CHUNK_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryReport {
    pub articles: usize,
    pub signatures: usize,
    pub text_table: PathBuf,
    pub notext_table: PathBuf,
}

/// Call `each` with every chunk of pages read from `input`. Unreadable
/// records are logged and skipped.
fn for_each_chunk(
    input: &Path,
    mut each: impl FnMut(Vec<Page>),
) -> Result<(), ConvertError> {
    let mut source = JsonlSource::open(input)?;
    loop {
        let chunk: Vec<_> = source.by_ref().take(CHUNK_SIZE).collect();
        if chunk.is_empty() {
            return Ok(());
        }
        let pages = chunk
            .into_iter()
            .filter_map(|item| {
                item.map_err(|e| warn!(error = %e, "skipping unreadable input record"))
                    .ok()
            })
            .flat_map(|article| article.pages)
            .collect();
        each(pages);
    }
}

/// Build draft dictionary tables from the article bodies of `input`.
pub fn run_inventory(
    portal: &CompiledPortal,
    input: &Path,
    output_dir: &Path,
) -> Result<InventoryReport, ConvertError> {
    let mut inventory = TagInventory::default();
    for_each_chunk(input, |pages| {
        let partial = pages
            .par_iter()
            .fold(TagInventory::default, |mut partial, page| {
                if let Some(imported) = import_article(&page.html, portal, &page.url) {
                    partial.record_article(&imported.doc, portal, &page.url);
                }
                partial
            })
            .reduce(TagInventory::default, TagInventory::merge);
        inventory = std::mem::take(&mut inventory).merge(partial);
    })?;

    std::fs::create_dir_all(output_dir).map_err(ConvertError::Inventory)?;
    let (text_table, notext_table) = inventory
        .write_tables(output_dir, &portal.name)
        .map_err(ConvertError::Inventory)?;
    info!(
        portal = %portal.name,
        articles = inventory.articles(),
        signatures = inventory.len(),
        "tag inventory written"
    );
    Ok(InventoryReport {
        articles: inventory.articles(),
        signatures: inventory.len(),
        text_table,
        notext_table,
    })
}

/// Every signature in `input` the portal dictionary does not know, sorted.
pub fn missing_dictionary_entries(
    portal: &CompiledPortal,
    input: &Path,
) -> Result<Vec<String>, ConvertError> {
    let mut missing = BTreeSet::new();
    for_each_chunk(input, |pages| {
        let found: BTreeSet<String> = pages
            .par_iter()
            .filter_map(|page| import_article(&page.html, portal, &page.url))
            .flat_map_iter(|imported| missing_signatures(&imported.doc, portal))
            .map(|signature| signature.to_string())
            .collect();
        missing.extend(found);
    })?;
    Ok(missing.into_iter().collect())
}

/// Fail when any signature of `input` is missing from the dictionary.
pub fn preflight(portal: &CompiledPortal, input: &Path) -> Result<(), ConvertError> {
    let missing = missing_dictionary_entries(portal, input)?;
    if missing.is_empty() {
        info!(portal = %portal.name, "dictionary covers every input signature");
        return Ok(());
    }
    for signature in &missing {
        warn!(portal = %portal.name, %signature, "missing from dictionary");
    }
    Err(ConvertError::MissingSignatures(missing))
}
