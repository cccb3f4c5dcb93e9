//! Detection and salvage of bodies with broken unicode escaping
//!
//! Some portals occasionally serve the article as a JSON snippet pasted into
//! HTML, with `á`-style escapes (often missing the backslash) and the
//! text repeated several times. Such bodies are flattened to plain text,
//! repaired, and cut at the end of the first copy.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::Thresholds;

static ESCAPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[uU][0-9]([0-9]{3}|[0-9][a-f])").expect("BUG: hardcoded escape token regex is invalid")
});

static UNICODE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\u([0-9a-fA-F]{4})").expect("BUG: hardcoded unicode escape regex is invalid")
});

/// End markers of the first copy of the article inside the JSON blob.
const STOP_MARKERS: [&str; 3] = [
    r#"aktiv":1}}}"#,
    r"\&#8221;aktiv\&#8221;:1}}}",
    r#"","aktiv":"1"}}}"#,
];

/// Number of whitespace-separated tokens that contain an escaped code point.
#[must_use]
pub fn escape_token_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| ESCAPE_TOKEN.is_match(token))
        .count()
}

#[must_use]
pub fn needs_salvage(text: &str, thresholds: &Thresholds) -> bool {
    escape_token_count(text) > thresholds.unicode_escape_density
        || text.matches("00e1").count() > thresholds.escaped_aacute_count
}

/// Join the non-empty text runs, repair their escapes and keep the first copy.
#[must_use]
pub fn salvage_text<'a>(runs: impl IntoIterator<Item = &'a str>) -> String {
    let joined = runs
        .into_iter()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .map(repair_escapes)
        .collect::<Vec<_>>()
        .join(" ");

    let cut = STOP_MARKERS
        .iter()
        .filter_map(|marker| joined.find(marker))
        .min();
    match cut {
        Some(end) => joined[..end].to_string(),
        None => joined,
    }
}

fn repair_escapes(run: &str) -> String {
    if !run.contains("u0") {
        return run.to_string();
    }
    let repaired = run
        .replace(r"\\", r"\")
        .replace('\u{201d}', "\"")
        .replace("u0", r"\u0")
        .replace(r"\\u0", r"\u0");
    decode_unicode_escapes(&repaired)
}

/// Decode `\uXXXX` escapes; sequences that are not a scalar value stay as they are.
#[must_use]
pub fn decode_unicode_escapes(text: &str) -> String {
    UNICODE_ESCAPE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_counts_tokens_not_occurrences() {
        assert_eq!(escape_token_count("u00e1ll u00e9s plain U0151"), 3);
        assert_eq!(escape_token_count("u00e1u00e9"), 1);
    }

    #[test]
    fn test_needs_salvage_thresholds() {
        let thresholds = Thresholds::default();
        let dense = "u00e1 ".repeat(26);
        assert!(needs_salvage(&dense, &thresholds));
        let sparse = "u00e1 ".repeat(5);
        assert!(!needs_salvage(&sparse, &thresholds));
        let glued = "x00e1".repeat(11);
        assert!(needs_salvage(&glued, &thresholds));
    }

    #[test]
    fn test_salvage_decodes_and_cuts_at_marker() {
        let runs = ["k\\u00e9t", "  ", r#"ház aktiv":1}}} két ház"#];
        assert_eq!(salvage_text(runs), "két ház ");
    }

    #[test]
    fn test_salvage_without_marker_keeps_everything() {
        assert_eq!(salvage_text(["v\u{e1}ros", "u00e1"]), "város á");
    }

    #[test]
    fn test_invalid_scalar_is_kept() {
        assert_eq!(decode_unicode_escapes(r"\ud800x"), r"\ud800x");
    }
}
