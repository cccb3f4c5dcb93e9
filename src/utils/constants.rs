//! Shared constants for article conversion
//!
//! Default calibration values used throughout the pipeline. Each threshold can
//! be overridden per portal through [`crate::config::Thresholds`].

/// Escaped-unicode token density: 25 tokens
///
/// Number of whitespace-separated tokens of the article text that look like
/// an escaped code point (`u00e1`, `U0151`, ...). Above this count the body
/// is treated as a JSON blob with broken encoding and the text is salvaged.
pub const UNICODE_ESCAPE_DENSITY: usize = 25;

/// Escaped `á` occurrences: 10
///
/// Second density signal. `00e1` is the most frequent escaped letter in
/// Hungarian text, so more than ten occurrences means broken encoding even
/// when the escapes are glued to other tokens.
pub const ESCAPED_AACUTE_COUNT: usize = 10;

/// Attribute value length above which the value becomes `@LONG`: 30
///
/// Longer values are too unique to group signatures by.
pub const LONG_ATTRIBUTE_VALUE: usize = 30;

/// Alphabetic run length kept in `@<run>NUM` simplification: more than 4
///
/// `attachment_6904733` simplifies to `@attachmentNUM`, while `p2` becomes
/// `@NUM`.
pub const MEANINGFUL_ALPHA_RUN: usize = 4;

/// Filename collision suffixes tried before the run aborts: 100
pub const COLLISION_LIMIT: usize = 100;

/// Longest readable filename stem produced by the debug writer
pub const READABLE_NAME_MAX: usize = 249;

/// Prefix marking elements below a configured media root
pub const MEDIA_DESCENDANT_PREFIX: &str = "0_MDESC_";

/// Articles converted per parallel chunk before results are handed to the writer
pub const CHUNK_SIZE: usize = 256;

/// Capacity of the channel between workers and the writer thread
pub const WRITER_QUEUE_CAPACITY: usize = 1024;

/// Number of example URLs stored per signature in the tag inventory
pub const INVENTORY_EXAMPLE_URLS: usize = 5;

/// Archive directory name used when an article has no publication date
pub const UNKNOWN_DATE_DIR: &str = "unknown_date";

/// Text of the note added to a document whose body came out empty
pub const EMPTY_ARTICLE_NOTE: &str = "A cikk tartalma az archiválás pillanatában nem volt elérhető./The content of the article was not available at the time of archiving.";

/// Text of the revision change added when the source page reports a modification
pub const MODIFIED_CHANGE_NOTE: &str = "article modified";
