// nemesis-sinks/src/jsonl.rs
// ============================================================================
// Module: JSON Lines Sink
// Description: Newline-delimited JSON writer for run results.
// Purpose: Persist raw outcomes in a line-oriented, append-friendly format.
// Dependencies: nemesis-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Each recorded run produces one `"kind": "outcome"` line per outcome record
//! followed by a single `"kind": "run"` line describing how the run ended.
//! The writer is flushed after every run so an interrupted session keeps every
//! completed run on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use nemesis_core::AbortReason;
use nemesis_core::OutcomeRecord;
use nemesis_core::ResultSink;
use nemesis_core::RunResult;
use nemesis_core::RunStatus;
use nemesis_core::SinkError;
use nemesis_core::StartBarrier;
use nemesis_core::duration_to_us;
use serde::Deserialize;
use serde::Serialize;

use crate::poisoned;

// ============================================================================
// SECTION: Line Types
// ============================================================================

/// Closing line written after the outcomes of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLine {
    /// Operation name.
    pub operation: String,
    /// Final status.
    pub status: RunStatus,
    /// Abort cause, if any.
    pub abort_reason: Option<AbortReason>,
    /// Start barrier outcome, if load was started.
    pub start_barrier: Option<StartBarrier>,
    /// Wall-clock span of perform, in microseconds.
    pub perform_us: Option<u64>,
    /// Cleanup failure, if any.
    pub cleanup_error: Option<String>,
    /// Workers that missed the teardown deadline.
    pub stuck_workers: Vec<String>,
    /// Number of outcome lines written for the run.
    pub outcomes: usize,
}

impl RunLine {
    /// Builds the closing line for `result`.
    #[must_use]
    pub fn from_result(result: &RunResult) -> Self {
        Self {
            operation: result.operation.clone(),
            status: result.status,
            abort_reason: result.abort_reason.clone(),
            start_barrier: result.start_barrier,
            perform_us: result.perform_window.map(|window| duration_to_us(window.duration())),
            cleanup_error: result.cleanup_error.clone(),
            stuck_workers: result.stuck_workers.iter().map(ToString::to_string).collect(),
            outcomes: result.total_outcomes(),
        }
    }
}

/// One line of output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonLine<'a> {
    /// Single attempt.
    Outcome(&'a OutcomeRecord),
    /// End of a run.
    Run(RunLine),
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Result sink writing newline-delimited JSON.
pub struct JsonLinesSink<W: Write + Send> {
    /// Destination writer.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Creates a sink writing into `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn record(&self, result: &RunResult) -> Result<(), SinkError> {
        let mut buffer = Vec::new();
        for record in &result.records() {
            push_line(&mut buffer, &JsonLine::Outcome(record))?;
        }
        push_line(&mut buffer, &JsonLine::Run(RunLine::from_result(result)))?;
        let mut writer = self.writer.lock().map_err(|_| poisoned("jsonl"))?;
        writer.write_all(&buffer).map_err(|err| SinkError::Write(err.to_string()))?;
        writer.flush().map_err(|err| SinkError::Write(err.to_string()))
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("jsonl"))?;
        writer.flush().map_err(|err| SinkError::Write(err.to_string()))
    }
}

/// Serializes `line` into `buffer` followed by a newline.
fn push_line(buffer: &mut Vec<u8>, line: &JsonLine<'_>) -> Result<(), SinkError> {
    serde_json::to_writer(&mut *buffer, line).map_err(|err| SinkError::Serialize(err.to_string()))?;
    buffer.push(b'\n');
    Ok(())
}
