// nemesis-sinks/tests/sinks/csv_tests.rs
// ============================================================================
// Module: CsvSink Unit Tests
// Description: Tests for the delimited outcome sink.
// Purpose: Validate header handling, quoting, and error handling.
// Dependencies: nemesis-core, nemesis-sinks
// ============================================================================

//! ## Overview
//! Exercises [`nemesis_sinks::CsvSink`] output.

use nemesis_core::ResultSink;
use nemesis_core::SinkError;
use nemesis_sinks::CSV_HEADER;
use nemesis_sinks::CsvSink;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::completed_result;
use super::common::skipped_result;

/// Tests the header is written exactly once across runs.
#[test]
fn csv_sink_writes_header_once() {
    let buffer = SharedBuffer::new();
    let sink = CsvSink::new(buffer.clone());

    sink.record(&completed_result("first")).expect("record");
    sink.record(&completed_result("second")).expect("record");

    let output = buffer.to_string_lossy();
    let header = CSV_HEADER.join(",");
    assert_eq!(output.matches(header.as_str()).count(), 1);
    assert!(output.starts_with(&header));
}

/// Tests plain rows are comma separated in record order.
#[test]
fn csv_sink_writes_plain_rows() {
    let buffer = SharedBuffer::new();
    let sink = CsvSink::new(buffer.clone());

    sink.record(&completed_result("add-nullable-column")).expect("record");

    let output = buffer.to_string_lossy();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[1], "add-nullable-column,completed,reader,0,10,5,true,");
    assert_eq!(lines[2], "add-nullable-column,completed,reader,1,20,900,false,database is locked");
}

/// Tests fields with quotes and newlines are quoted with doubled quotes.
#[test]
fn csv_sink_quotes_special_fields() {
    let buffer = SharedBuffer::new();
    let sink = CsvSink::new(buffer.clone());

    sink.record(&completed_result("op")).expect("record");

    let output = buffer.to_string_lossy();
    assert!(output.ends_with(
        "op,completed,insert,0,60,3,false,\"near \"\"x\"\": syntax error, line\nbreak\"\n"
    ));
}

/// Tests a custom delimiter only quotes fields containing that delimiter.
#[test]
fn csv_sink_with_custom_delimiter() {
    let buffer = SharedBuffer::new();
    let sink = CsvSink::with_delimiter(buffer.clone(), b';');

    sink.record(&completed_result("a;b")).expect("record");

    let output = buffer.to_string_lossy();
    let second = output.lines().nth(1).expect("row");
    assert_eq!(second, "\"a;b\";completed;reader;0;10;5;true;");
}

/// Tests skipped runs write only the header.
#[test]
fn csv_sink_skipped_run_adds_no_rows() {
    let buffer = SharedBuffer::new();
    let sink = CsvSink::new(buffer.clone());

    sink.record(&skipped_result("rename-index")).expect("record");

    assert_eq!(buffer.to_string_lossy(), format!("{}\n", CSV_HEADER.join(",")));
}

/// Tests write failures surface as write errors.
#[test]
fn csv_sink_fails_on_write_error() {
    let sink = CsvSink::new(FailingWriter);

    let err = sink.record(&skipped_result("op")).unwrap_err();

    assert!(matches!(err, SinkError::Write(_)));
}
