//! Structural rewrite passes over a normalized article tree
//!
//! Each pass takes the tree by `&mut` and never fails: anomalies are
//! resolved in place and logged. [`crate::pipeline::Engine`] runs them in a
//! fixed order.

pub mod bigram;
pub mod blocks;
pub mod cleanup;
pub mod media;
pub mod paragraphs;
pub mod table;
pub mod wrappers;
pub mod wrapping;

pub use bigram::rename_by_bigram_rules;
pub use blocks::{block_specific_curation, block_specific_renaming, block_structure};
pub use cleanup::{clean_leftovers, demote_misplaced_leads, resolve_sections};
pub use media::{handle_media, remove_empty_media, wrap_media_text};
pub use paragraphs::{deal_with_paragraphs, fix_formatting_hierarchy};
pub use table::{correct_table_structure, disambiguate_table_or_frame};
pub use wrappers::remove_unnecessary_wrappers;
pub use wrapping::{complex_wrap, missing_root_replacement};
