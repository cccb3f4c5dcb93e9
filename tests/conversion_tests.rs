//! Full conversion runs: input file in, archive, digests and URL lists out

use article_tei::schema::{validate, validate_bytes};
use article_tei::tei::from_bytes;
use article_tei::utils::EMPTY_ARTICLE_NOTE;
use article_tei::{Grammar, OutputMode, RunConfig, load_portal, run_conversion};
use assert_fs::TempDir;
use assert_fs::prelude::*;
use chrono::DateTime;
use serde_json::{Value, json};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

mod common;
use common::{ROWS, page, write_input, write_portal};

fn run_config(dir: &TempDir, mode: OutputMode) -> RunConfig {
    common::init_test_logging();
    let portal = load_portal(&write_portal(dir, ROWS)).expect("portal loads");
    RunConfig::builder()
        .portal(portal)
        .output_dir(dir.path().join("out"))
        .mode(mode)
        .processed_at(DateTime::parse_from_rfc3339("2024-01-01T12:00:00+01:00").expect("date"))
        .build()
        .expect("run config")
}

fn archive_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).expect("archive exists");
    let mut zip = zip::ZipArchive::new(file).expect("readable zip");
    (0..zip.len())
        .map(|i| {
            let mut entry = zip.by_index(i).expect("entry");
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).expect("entry bytes");
            (entry.name().to_string(), bytes)
        })
        .collect()
}

fn strict_grammar() -> Grammar {
    let mut grammar: Value =
        serde_json::from_str(include_str!("../src/schema/tei_subset.json")).expect("grammar json");
    let children = grammar["elements"]["p"]["children"]
        .as_array_mut()
        .expect("p lists its children");
    children.retain(|child| child != "hi");
    Grammar::from_json(&grammar.to_string()).expect("strict grammar compiles")
}

#[test]
fn test_conversion_archives_valid_documents() {
    let dir = TempDir::new().expect("tempdir");
    let config = run_config(&dir, OutputMode::Archive);
    let first = page(
        "https://example.hu/hirek/egy",
        "<article><h2>Alcím</h2><p>Első <b>bekezdés</b>.</p></article>",
    );
    let input = write_input(
        &dir,
        &[
            first.clone(),
            page("https://example.hu/hirek/ketto", "<article><p>Másik cikk.</p></article>"),
            first,
            page("https://example.hu/hirek/ures", "<article><script>x()</script></article>"),
            json!({"pages": [
                page("https://example.hu/hirek/hosszu", "<article><p>Első oldal.</p></article>"),
                page("https://example.hu/hirek/hosszu?page=2", "<article><p>Második oldal.</p></article>"),
            ]}),
        ],
    );

    let summary = run_conversion(&config, &input).expect("conversion runs");
    assert_eq!(summary.archived, 5);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.quarantined, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        summary.first_published,
        Some(DateTime::parse_from_rfc3339("2021-03-03T08:30:00+01:00").expect("date"))
    );

    let entries = archive_entries(&config.archive_path());
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|(name, _)| name.starts_with("2021-03-03/")));
    assert_eq!(
        entries.iter().filter(|(name, _)| name.ends_with("_1.xml")).count(),
        1,
        "the repeated article gets a suffixed name"
    );

    let grammar = Grammar::builtin();
    let mut empty_documents = 0;
    for (name, bytes) in &entries {
        let document = from_bytes(bytes).expect("archived documents parse");
        if let Err(e) = validate(&grammar, &document) {
            panic!("{name} does not validate: {e}");
        }
        if document.text().contains(EMPTY_ARTICLE_NOTE) {
            empty_documents += 1;
        }
    }
    assert_eq!(empty_documents, 1);

    let hashsums = std::fs::read_to_string(config.hashsums_path()).expect("hashsums written");
    let mut lines = hashsums.lines();
    assert!(lines.next().is_some_and(|header| header.starts_with("filename\turl\t")));
    assert_eq!(lines.count(), 5);

    let urls = std::fs::read_to_string(dir.path().join("out/example_urls.txt")).expect("url list");
    assert_eq!(urls.lines().count(), 5);
    assert!(urls.lines().any(|url| url == "https://example.hu/hirek/ketto"));
}

#[test]
fn test_invalid_documents_are_quarantined() {
    let dir = TempDir::new().expect("tempdir");
    let strict = Arc::new(strict_grammar());
    let portal = load_portal(&write_portal(&dir, ROWS)).expect("portal loads");
    let config = RunConfig::builder()
        .portal(portal)
        .output_dir(dir.path().join("out"))
        .grammar(Arc::clone(&strict))
        .build()
        .expect("run config");
    let input = write_input(
        &dir,
        &[
            page("https://example.hu/a", "<article><p>Sima szöveg.</p></article>"),
            page("https://example.hu/b", "<article><p>Egy <b>kiemelt</b> szó.</p></article>"),
        ],
    );

    let summary = run_conversion(&config, &input).expect("conversion runs");
    assert_eq!(summary.archived, 1);
    assert_eq!(summary.quarantined, 1);

    let quarantined: Vec<_> = std::fs::read_dir(config.quarantine_dir())
        .expect("quarantine directory")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    assert_eq!(quarantined.len(), 1);
    let bytes = std::fs::read(&quarantined[0]).expect("quarantined file");
    assert!(validate_bytes(&strict, &bytes).is_err());
    assert!(validate_bytes(&Grammar::builtin(), &bytes).is_ok());

    let bad = std::fs::read_to_string(dir.path().join("out/example_bad_urls.txt")).expect("bad url list");
    assert_eq!(bad.trim_end(), "https://example.hu/b\tnot valid");
}

#[test]
fn test_unreadable_lines_are_counted_and_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let config = run_config(&dir, OutputMode::Archive);
    let good = page("https://example.hu/jo", "<article><p>Rendben.</p></article>").to_string();
    let input = dir.child("pages.jsonl");
    input
        .write_str(&format!("{good}\n{{not json\n\n{good}\n"))
        .expect("write input");

    let summary = run_conversion(&config, input.path()).expect("conversion runs");
    assert_eq!(summary.archived, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total(), 3);
}

#[test]
fn test_debug_mode_uses_readable_names() {
    let dir = TempDir::new().expect("tempdir");
    let config = run_config(&dir, OutputMode::Debug);
    let input = write_input(
        &dir,
        &[
            page("https://example.hu/hirek/cikk-egy.html", "<article><p>Egy.</p></article>"),
            page("https://example.hu/sport/cikk-egy.html", "<article><p>Kettő.</p></article>"),
        ],
    );

    let summary = run_conversion(&config, &input).expect("conversion runs");
    assert_eq!(summary.archived, 2);
    let debug_dir = config.quarantine_dir();
    assert!(debug_dir.join("cikk-egy.xml").is_file());
    assert!(debug_dir.join("cikk-egy_1.xml").is_file());
    assert!(!config.archive_path().exists());
}
