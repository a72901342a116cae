// nemesis-sinks/tests/sinks/file_tests.rs
// ============================================================================
// Module: File Sink Unit Tests
// Description: Tests for file-backed sink construction.
// Purpose: Validate format selection and on-disk output.
// Dependencies: nemesis-core, nemesis-sinks, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`nemesis_sinks::open_file_sink`].

use std::fs;

use nemesis_sinks::CSV_HEADER;
use nemesis_sinks::SinkFormat;
use nemesis_sinks::open_file_sink;
use tempfile::TempDir;

use super::common::completed_result;

/// Tests JSON lines output lands on disk after a flush.
#[test]
fn file_sink_writes_jsonl_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("out").join("results.jsonl");

    let sink = open_file_sink(SinkFormat::Jsonl, &path).expect("open");
    sink.record(&completed_result("op")).expect("record");
    sink.flush().expect("flush");

    let content = fs::read_to_string(&path).expect("read");
    assert_eq!(content.lines().count(), 6);
}

/// Tests CSV output starts with the header.
#[test]
fn file_sink_writes_csv_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("results.csv");

    let sink = open_file_sink(SinkFormat::Csv, &path).expect("open");
    sink.record(&completed_result("op")).expect("record");
    drop(sink);

    let content = fs::read_to_string(&path).expect("read");
    assert!(content.starts_with(&CSV_HEADER.join(",")));
}

/// Tests existing files are truncated.
#[test]
fn file_sink_truncates_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("results.jsonl");
    fs::write(&path, "stale\n").expect("seed");

    let sink = open_file_sink(SinkFormat::Jsonl, &path).expect("open");
    sink.flush().expect("flush");

    assert_eq!(fs::read_to_string(&path).expect("read"), "");
}

/// Tests format labels match their serialized form.
#[test]
fn sink_format_labels() {
    assert_eq!(SinkFormat::default(), SinkFormat::Jsonl);
    assert_eq!(SinkFormat::Csv.to_string(), "csv");
    let parsed: SinkFormat = serde_json::from_str("\"csv\"").expect("parse");
    assert_eq!(parsed, SinkFormat::Csv);
}
