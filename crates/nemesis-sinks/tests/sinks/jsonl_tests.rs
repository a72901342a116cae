// nemesis-sinks/tests/sinks/jsonl_tests.rs
// ============================================================================
// Module: JsonLinesSink Unit Tests
// Description: Tests for the newline-delimited JSON sink.
// Purpose: Validate line layout, run lines, flushing, and error handling.
// Dependencies: nemesis-core, nemesis-sinks, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`nemesis_sinks::JsonLinesSink`] output.

use nemesis_core::ResultSink;
use nemesis_core::SinkError;
use nemesis_sinks::JsonLinesSink;
use nemesis_sinks::RunLine;
use serde_json::Value;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::completed_result;
use super::common::skipped_result;
use super::common::teardown_aborted_result;

fn parse_lines(output: &str) -> Vec<Value> {
    output.lines().map(|line| serde_json::from_str(line).expect("parse json line")).collect()
}

/// Tests one outcome line per record followed by a run line.
#[test]
fn jsonl_sink_writes_outcomes_then_run_line() {
    let buffer = SharedBuffer::new();
    let sink = JsonLinesSink::new(buffer.clone());

    sink.record(&completed_result("add-nullable-column")).expect("record");

    let lines = parse_lines(&buffer.to_string_lossy());
    assert_eq!(lines.len(), 6);
    for line in &lines[.. 5] {
        assert_eq!(line["kind"], "outcome");
        assert_eq!(line["operation"], "add-nullable-column");
        assert_eq!(line["status"], "completed");
    }
    let run = &lines[5];
    assert_eq!(run["kind"], "run");
    assert_eq!(run["outcomes"], 5);
    assert_eq!(run["perform_us"], 40);
    assert_eq!(run["start_barrier"]["state"], "confirmed");
    assert!(run["abort_reason"].is_null());
}

/// Tests outcome lines keep role grouping and per-role time order.
#[test]
fn jsonl_sink_orders_outcomes_by_role_then_offset() {
    let buffer = SharedBuffer::new();
    let sink = JsonLinesSink::new(buffer.clone());

    sink.record(&completed_result("op")).expect("record");

    let lines = parse_lines(&buffer.to_string_lossy());
    let order: Vec<(String, u64)> = lines[.. 5]
        .iter()
        .map(|line| {
            (line["role"].as_str().unwrap().to_string(), line["offset_us"].as_u64().unwrap())
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("reader".to_string(), 10),
            ("reader".to_string(), 20),
            ("reader".to_string(), 30),
            ("insert".to_string(), 12),
            ("insert".to_string(), 60),
        ]
    );
    assert_eq!(lines[1]["success"], false);
    assert_eq!(lines[1]["error"], "database is locked");
    assert_eq!(lines[1]["worker"], 1);
    assert!(lines[0]["error"].is_null());
}

/// Tests skipped runs produce only a run line.
#[test]
fn jsonl_sink_writes_run_line_for_skipped_run() {
    let buffer = SharedBuffer::new();
    let sink = JsonLinesSink::new(buffer.clone());

    sink.record(&skipped_result("rename-index")).expect("record");

    let output = buffer.to_string_lossy();
    let run: RunLine = serde_json::from_str(output.trim_end()).expect("run line");
    assert_eq!(output.lines().count(), 1);
    assert_eq!(run.operation, "rename-index");
    assert_eq!(run.outcomes, 0);
    assert!(run.start_barrier.is_none());
}

/// Tests teardown aborts name the stuck workers.
#[test]
fn jsonl_sink_records_abort_reason_and_stuck_workers() {
    let buffer = SharedBuffer::new();
    let sink = JsonLinesSink::new(buffer.clone());

    sink.record(&teardown_aborted_result("rename-table")).expect("record");

    let lines = parse_lines(&buffer.to_string_lossy());
    let run = lines.last().expect("run line");
    assert_eq!(run["status"], "aborted");
    assert_eq!(run["abort_reason"]["phase"], "teardown");
    assert_eq!(run["stuck_workers"][0], "update-2");
    assert_eq!(lines[0]["status"], "aborted");
}

/// Tests the writer is flushed after every run.
#[test]
fn jsonl_sink_flushes_after_each_run() {
    let buffer = SharedBuffer::new();
    let sink = JsonLinesSink::new(buffer.clone());

    sink.record(&skipped_result("a")).expect("record");
    sink.record(&skipped_result("b")).expect("record");

    assert_eq!(buffer.flushes(), 2);
    assert!(buffer.to_string_lossy().ends_with('\n'));
}

/// Tests write failures surface as write errors.
#[test]
fn jsonl_sink_fails_on_write_error() {
    let sink = JsonLinesSink::new(FailingWriter);

    let err = sink.record(&completed_result("op")).unwrap_err();

    assert!(matches!(err, SinkError::Write(_)));
}
