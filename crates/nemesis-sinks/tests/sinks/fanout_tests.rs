// nemesis-sinks/tests/sinks/fanout_tests.rs
// ============================================================================
// Module: FanoutSink Unit Tests
// Description: Tests for the fan-out result sink.
// Purpose: Validate delivery to every member and first-error reporting.
// Dependencies: nemesis-core, nemesis-sinks
// ============================================================================

//! ## Overview
//! Exercises [`nemesis_sinks::FanoutSink`] delegation.

use nemesis_core::InMemoryResultSink;
use nemesis_core::ResultSink;
use nemesis_core::SinkError;
use nemesis_sinks::CsvSink;
use nemesis_sinks::FanoutSink;
use nemesis_sinks::JsonLinesSink;

use super::common::FailingWriter;
use super::common::SharedBuffer;
use super::common::completed_result;

/// Tests every member receives the result.
#[test]
fn fanout_sink_records_into_every_member() {
    let memory = InMemoryResultSink::new();
    let buffer = SharedBuffer::new();
    let sink = FanoutSink::new()
        .with_sink(Box::new(memory.clone()))
        .with_sink(Box::new(JsonLinesSink::new(buffer.clone())));

    sink.record(&completed_result("op")).expect("record");
    sink.flush().expect("flush");

    assert_eq!(sink.len(), 2);
    assert_eq!(memory.results().expect("results").len(), 1);
    assert_eq!(buffer.to_string_lossy().lines().count(), 6);
}

/// Tests later members still record after an earlier member fails.
#[test]
fn fanout_sink_attempts_all_members_and_returns_first_error() {
    let memory = InMemoryResultSink::new();
    let sink = FanoutSink::new()
        .with_sink(Box::new(CsvSink::new(FailingWriter)))
        .with_sink(Box::new(JsonLinesSink::new(FailingWriter)))
        .with_sink(Box::new(memory.clone()));

    let err = sink.record(&completed_result("op")).unwrap_err();

    assert!(matches!(err, SinkError::Write(_)));
    assert_eq!(memory.results().expect("results").len(), 1);
}

/// Tests an empty fan-out accepts results.
#[test]
fn fanout_sink_without_members_is_a_no_op() {
    let sink = FanoutSink::new();

    sink.record(&completed_result("op")).expect("record");

    assert!(sink.is_empty());
}
