// nemesis-sinks/src/lib.rs
// ============================================================================
// Module: Nemesis Sinks Library
// Description: Result sinks for profiling sessions.
// Purpose: Persist or forward every run result the profiler emits.
// Dependencies: nemesis-core, serde, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! Sinks implement [`nemesis_core::ResultSink`]. They receive one
//! [`nemesis_core::RunResult`] per catalog operation and store it without
//! analysis:
//! - [`JsonLinesSink`] writes one JSON object per outcome plus a run line.
//! - [`CsvSink`] writes one delimited row per outcome under a single header.
//! - [`ChannelSink`] forwards results to an in-process consumer.
//! - [`FanoutSink`] records into several sinks at once.
//!
//! Invariants:
//! - A write failure is reported to the caller; the run is never repeated.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod channel;
pub mod csv;
pub mod fanout;
pub mod file;
pub mod jsonl;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use channel::ChannelSink;
pub use csv::CSV_HEADER;
pub use csv::CsvSink;
pub use fanout::FanoutSink;
pub use file::SinkFormat;
pub use file::open_file_sink;
pub use jsonl::JsonLinesSink;
pub use jsonl::RunLine;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Error for a sink whose writer lock was poisoned by a panicking writer.
pub(crate) fn poisoned(sink: &str) -> nemesis_core::SinkError {
    nemesis_core::SinkError::Closed(format!("{sink} writer lock poisoned"))
}
