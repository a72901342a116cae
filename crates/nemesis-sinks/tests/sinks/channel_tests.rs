// nemesis-sinks/tests/sinks/channel_tests.rs
// ============================================================================
// Module: ChannelSink Unit Tests
// Description: Tests for the channel-based result sink.
// Purpose: Validate forwarding and full/closed channel handling.
// Dependencies: nemesis-core, nemesis-sinks, tokio
// ============================================================================

//! ## Overview
//! Exercises [`nemesis_sinks::ChannelSink`] delivery behavior.

use nemesis_core::ResultSink;
use nemesis_core::RunResult;
use nemesis_core::SinkError;
use nemesis_sinks::ChannelSink;

use super::common::completed_result;
use super::common::skipped_result;

/// Tests results arrive unchanged and in order.
#[test]
fn channel_sink_forwards_results_in_order() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<RunResult>(4);
    let sink = ChannelSink::new(tx);

    sink.record(&completed_result("first")).expect("record");
    sink.record(&skipped_result("second")).expect("record");

    assert_eq!(rx.try_recv().expect("recv"), completed_result("first"));
    assert_eq!(rx.try_recv().expect("recv").operation, "second");
    assert!(rx.try_recv().is_err());
}

/// Tests a full channel is reported as a write failure.
#[test]
fn channel_sink_fails_when_channel_full() {
    let (tx, _rx) = tokio::sync::mpsc::channel::<RunResult>(1);
    let sink = ChannelSink::new(tx);

    sink.record(&skipped_result("first")).expect("first record");
    let err = sink.record(&skipped_result("second")).unwrap_err();

    assert!(matches!(err, SinkError::Write(_)));
    assert!(err.to_string().contains("second"));
}

/// Tests a dropped receiver is reported as closed.
#[test]
fn channel_sink_fails_when_receiver_dropped() {
    let (tx, rx) = tokio::sync::mpsc::channel::<RunResult>(1);
    let sink = ChannelSink::new(tx);
    drop(rx);

    let err = sink.record(&skipped_result("op")).unwrap_err();

    assert!(matches!(err, SinkError::Closed(_)));
}
