// nemesis-sinks/src/fanout.rs
// ============================================================================
// Module: Fan-Out Sink
// Description: Records every result into several sinks.
// Purpose: Write one session to multiple destinations at once.
// Dependencies: nemesis-core, tracing
// ============================================================================

//! ## Overview
//! Every member is attempted for every call, even after an earlier member
//! fails; the first error is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nemesis_core::ResultSink;
use nemesis_core::RunResult;
use nemesis_core::SinkError;
use tracing::warn;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Result sink delegating to several member sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    /// Member sinks.
    sinks: Vec<Box<dyn ResultSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of member sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true when there are no member sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Applies `call` to every member, returning the first error.
    fn each(
        &self,
        call: impl Fn(&dyn ResultSink) -> Result<(), SinkError>,
    ) -> Result<(), SinkError> {
        let mut first_error = None;
        for (index, sink) in self.sinks.iter().enumerate() {
            if let Err(err) = call(sink.as_ref()) {
                warn!(sink = index, error = %err, "fan-out member failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl ResultSink for FanoutSink {
    fn record(&self, result: &RunResult) -> Result<(), SinkError> {
        self.each(|sink| sink.record(result))
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.each(|sink| sink.flush())
    }
}
