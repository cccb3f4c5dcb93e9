//! Conversion of news-article HTML into schema-valid TEI XML.
//!
//! The article body selected by a portal configuration is imported into a
//! [`tree::DocTree`], renamed through the portal dictionary, rewritten by a
//! fixed sequence of structural passes and mapped onto TEI. Documents that
//! validate against the output grammar go into a content-addressed zip
//! archive; the others are quarantined.

pub mod config;
pub mod encoding;
pub mod errors;
pub mod link_corrector;
pub mod normalize;
pub mod passes;
pub mod pipeline;
pub mod rules;
pub mod schema;
pub mod tei;
pub mod tree;
pub mod utils;
pub mod writer;

pub use config::{CompiledPortal, ConfigError, OutputMode, PortalConfig, RunConfig, load_portal};
pub use errors::ConvertError;
pub use pipeline::{
    ArticleMeta, ArticleOutcome, Engine, InventoryReport, RunSummary, run_conversion,
    run_inventory,
};
pub use schema::{Grammar, GrammarError, ValidationError};
pub use tree::{DocTree, Kind};
pub use writer::{DigestAlgorithm, WriteError};
