//! Fixtures shared by the integration tests: portal files and JSON-lines input

use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::{Value, json};
use std::path::PathBuf;

/// Dictionary used by most tests: `(signature, normal name, preserved attribute)`.
#[allow(dead_code)]
pub const ROWS: &[(&str, &str, &str)] = &[
    ("<div class=x>", "box", "default"),
    ("<div>", "unwrap", "default"),
    ("<p>", "paragraph", "default"),
    ("<h2>", "heading", "default"),
    ("<b>", "bold", "default"),
    ("<strong>", "bold", "default"),
    ("<i>", "italic", "default"),
    ("<ul>", "list", "default"),
    ("<li>", "list_item", "default"),
    ("<blockquote>", "quote", "default"),
    ("<section>", "lead", "default"),
    ("<aside>", "gallery", "default"),
    ("<figure>", "media_content", "default"),
    ("<table>", "table", "default"),
    ("<tbody>", "unwrap", "default"),
    ("<tr>", "row", "default"),
    ("<td>", "column", "default"),
    ("<span>", "unwrap", "default"),
    ("<script>", "decompose", "default"),
];

/// Write `{portal}.json` and its dictionary table into `dir`, returning the config path.
#[allow(dead_code)]
pub fn write_portal(dir: &TempDir, rows: &[(&str, &str, &str)]) -> PathBuf {
    let mut table = String::from(
        "frequency\ttag\tavg_text\tavg_descendants\tavg_immediate_text\texamples\tnormal_name\tpreserved_attribute\n",
    );
    for (signature, normal, preserved) in rows {
        table.push_str(&format!("1\t{signature}\t0\t0\t0\t-\t{normal}\t{preserved}\n"));
    }
    dir.child("example_tags.tsv")
        .write_str(&table)
        .expect("write dictionary");

    let config = json!({
        "portal_name": "example",
        "url_prefix": "https://example.hu",
        "article_roots": ["article", "body"],
        "dictionary_paths": ["example_tags.tsv"],
        "publisher": "Example Kiadó",
    });
    let file = dir.child("example.json");
    file.write_str(&config.to_string()).expect("write portal config");
    file.path().to_path_buf()
}

/// One crawled page as it appears in the input.
#[allow(dead_code)]
pub fn page(url: &str, html: &str) -> Value {
    json!({
        "url": url,
        "crawl_timestamp": "2021-03-04T10:00:00+01:00",
        "record_id": format!("rec-{url}"),
        "html": html,
        "meta": {
            "title": "Próba cikk",
            "authors": ["Kovács Anna"],
            "published": "2021-03-03T08:30:00+01:00",
        },
    })
}

/// Write one JSON value per line into `pages.jsonl`.
#[allow(dead_code)]
pub fn write_input(dir: &TempDir, records: &[Value]) -> PathBuf {
    let lines: Vec<String> = records.iter().map(Value::to_string).collect();
    let file = dir.child("pages.jsonl");
    file.write_str(&lines.join("\n")).expect("write input");
    file.path().to_path_buf()
}

/// Route engine logs through the test harness so they show up for failing tests.
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("article_tei=debug"))
        .with_test_writer()
        .try_init();
}
