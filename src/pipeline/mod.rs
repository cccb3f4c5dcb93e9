//! Article pipeline: reading input, running the engine, writing results

pub mod engine;
pub mod inventory;
pub mod multipage;
pub mod orchestrator;
pub mod source;

pub use engine::{ArticleOutcome, Engine};
pub use inventory::{InventoryReport, missing_dictionary_entries, preflight, run_inventory};
pub use multipage::merge_meta;
pub use orchestrator::{ArticleResult, RunSummary, convert_article, run_conversion};
pub use source::{ArticleMeta, JsonlSource, Page, SourceArticle, SourceError};
