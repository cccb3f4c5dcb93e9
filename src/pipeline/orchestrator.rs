//! Batch conversion
//!
//! Input articles are read in chunks. Each chunk is converted in parallel
//! (results keep input order), then handed over a bounded channel to the
//! single thread that owns every output file.

use chrono::{DateTime, FixedOffset};
use crossbeam_channel::{Sender, bounded};
use rayon::prelude::*;
use std::path::Path;
use tracing::{error, info, warn};

use super::engine::Engine;
use super::inventory::preflight;
use super::multipage::merge_meta;
use super::source::{JsonlSource, SourceArticle};
use crate::config::{OutputMode, RunConfig};
use crate::errors::ConvertError;
use crate::schema::validate;
use crate::tei::{
    ConvertedBody, DocumentBody, DocumentHeader, PageBody, article_pid, build_document, to_bytes,
};
use crate::utils::WRITER_QUEUE_CAPACITY;
use crate::writer::{DocumentSink, OutputDocument, Verdict, WriteError};

/// What happened to one input article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleResult {
    Document {
        document: OutputDocument,
        verdict: Verdict,
        /// No page produced content; the document carries the empty-article note
        empty: bool,
        crawl_timestamp: DateTime<FixedOffset>,
    },
    Skipped {
        url: String,
        reason: &'static str,
    },
}

/// Counters and date ranges of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents stored in the archive (or the debug directory), empty ones included
    pub archived: usize,
    pub empty: usize,
    pub quarantined: usize,
    /// Unreadable input lines and articles without a body root
    pub failed: usize,
    pub first_published: Option<DateTime<FixedOffset>>,
    pub last_published: Option<DateTime<FixedOffset>>,
    pub first_crawled: Option<DateTime<FixedOffset>>,
    pub last_crawled: Option<DateTime<FixedOffset>>,
}

fn widen(
    first: &mut Option<DateTime<FixedOffset>>,
    last: &mut Option<DateTime<FixedOffset>>,
    value: DateTime<FixedOffset>,
) {
    *first = Some(first.map_or(value, |f| f.min(value)));
    *last = Some(last.map_or(value, |l| l.max(value)));
}

impl RunSummary {
    fn record(&mut self, result: &ArticleResult) {
        match result {
            ArticleResult::Skipped { .. } => self.failed += 1,
            ArticleResult::Document {
                verdict: Verdict::Invalid(_),
                ..
            } => self.quarantined += 1,
            ArticleResult::Document {
                document,
                empty,
                crawl_timestamp,
                ..
            } => {
                self.archived += 1;
                if *empty {
                    self.empty += 1;
                }
                if let Some(published) = document.published {
                    widen(&mut self.first_published, &mut self.last_published, published);
                }
                widen(&mut self.first_crawled, &mut self.last_crawled, *crawl_timestamp);
            }
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.archived + self.quarantined + self.failed
    }

    fn log(&self, portal: &str) {
        info!(
            portal,
            archived = self.archived,
            empty = self.empty,
            quarantined = self.quarantined,
            failed = self.failed,
            "run finished"
        );
        match (self.first_published, self.last_published) {
            (Some(first), Some(last)) => info!(portal, %first, %last, "publication date range"),
            _ => info!(portal, "no publication dates"),
        }
        if let (Some(first), Some(last)) = (self.first_crawled, self.last_crawled) {
            info!(portal, %first, %last, "crawl date range");
        }
    }
}

/// Convert one article (all of its pages) into a finished document.
#[must_use]
pub fn convert_article(engine: Engine<'_>, config: &RunConfig, article: &SourceArticle) -> ArticleResult {
    let first = article.first_page();
    let skipped = |reason| ArticleResult::Skipped {
        url: first.url.clone(),
        reason,
    };

    let body = if article.is_multipage() {
        let mut found = 0;
        let pages: Vec<PageBody> = article
            .pages
            .iter()
            .map(|page| {
                let body = match engine.convert_html(&page.html, &page.url).into_body() {
                    Some(body) => {
                        found += 1;
                        body
                    }
                    None => {
                        warn!(url = %page.url, "page without article root, kept empty");
                        ConvertedBody::Empty
                    }
                };
                PageBody {
                    url: page.url.clone(),
                    record_id: page.record_id.clone(),
                    crawl_timestamp: page.crawl_timestamp,
                    body,
                }
            })
            .collect();
        if found == 0 {
            return skipped("article root not found");
        }
        DocumentBody::Pages(pages)
    } else {
        match engine.convert_html(&first.html, &first.url).into_body() {
            Some(body) => DocumentBody::Single(body),
            None => return skipped("article root not found"),
        }
    };

    let merged;
    let meta = if article.is_multipage() {
        merged = merge_meta(&article.pages);
        &merged
    } else {
        &first.meta
    };

    let header = DocumentHeader {
        pid: article_pid(&first.url, &first.crawl_timestamp),
        url: &first.url,
        record_id: &first.record_id,
        crawl_timestamp: first.crawl_timestamp,
        processed_at: config.processed_at(),
        publisher: &config.portal().publisher,
        meta,
    };
    let empty = body.is_empty();
    let tei = build_document(&header, body);

    let verdict = match config.mode() {
        OutputMode::Debug => Verdict::Unchecked,
        OutputMode::Archive => match validate(config.grammar(), &tei) {
            Ok(()) => Verdict::Valid,
            Err(violation) => Verdict::Invalid(violation),
        },
    };
    let bytes = match to_bytes(&tei) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(url = %first.url, error = %e, "failed to serialize document");
            return skipped("serialization failed");
        }
    };

    ArticleResult::Document {
        document: OutputDocument {
            pid: header.pid,
            url: first.url.clone(),
            published: meta.published,
            bytes,
        },
        verdict,
        empty,
        crawl_timestamp: first.crawl_timestamp,
    }
}

enum WriterMessage {
    Document(OutputDocument, Verdict),
    Skipped { url: String, reason: &'static str },
}

impl From<ArticleResult> for WriterMessage {
    fn from(result: ArticleResult) -> Self {
        match result {
            ArticleResult::Document {
                document, verdict, ..
            } => WriterMessage::Document(document, verdict),
            ArticleResult::Skipped { url, reason } => WriterMessage::Skipped { url, reason },
        }
    }
}

/// Convert every article of `input` and write the results.
pub fn run_conversion(config: &RunConfig, input: &Path) -> Result<RunSummary, ConvertError> {
    if config.portal().strict_dictionary {
        preflight(config.portal(), input)?;
    }

    let engine = Engine::new(config.portal());
    let mut sink = DocumentSink::open(config)?;
    let (tx, rx) = bounded::<WriterMessage>(WRITER_QUEUE_CAPACITY);
    let mut summary = RunSummary::default();

    info!(portal = config.portal_name(), input = %input.display(), "conversion started");
    std::thread::scope(|scope| -> Result<(), ConvertError> {
        let writer = scope.spawn(move || -> Result<(), WriteError> {
            for message in rx {
                match message {
                    WriterMessage::Document(document, verdict) => {
                        sink.write(&document, &verdict)?;
                    }
                    WriterMessage::Skipped { url, reason } => sink.skipped(&url, reason)?,
                }
            }
            sink.finish()
        });

        let produced = produce(config, engine, input, &tx, &mut summary);
        drop(tx);
        writer.join().map_err(|_| WriteError::Disconnected)??;
        produced
    })?;

    summary.log(config.portal_name());
    Ok(summary)
}

fn produce(
    config: &RunConfig,
    engine: Engine<'_>,
    input: &Path,
    tx: &Sender<WriterMessage>,
    summary: &mut RunSummary,
) -> Result<(), ConvertError> {
    let mut source = JsonlSource::open(input)?;
    loop {
        let chunk: Vec<_> = source.by_ref().take(config.chunk_size()).collect();
        if chunk.is_empty() {
            return Ok(());
        }

        let mut articles = Vec::with_capacity(chunk.len());
        for item in chunk {
            match item {
                Ok(article) => articles.push(article),
                Err(e) => {
                    error!(error = %e, "skipping unreadable input record");
                    summary.failed += 1;
                }
            }
        }

        let results: Vec<ArticleResult> = if config.sequential() {
            articles
                .iter()
                .map(|article| convert_article(engine, config, article))
                .collect()
        } else {
            articles
                .par_iter()
                .map(|article| convert_article(engine, config, article))
                .collect()
        };

        for result in results {
            summary.record(&result);
            tx.send(result.into())
                .map_err(|_| WriteError::Disconnected)?;
        }
    }
}
