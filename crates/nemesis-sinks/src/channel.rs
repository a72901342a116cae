// nemesis-sinks/src/channel.rs
// ============================================================================
// Module: Channel Sink
// Description: Forwards run results over a tokio mpsc channel.
// Purpose: Hand results to in-process consumers without blocking the session.
// Dependencies: nemesis-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelSink`] uses `try_send`, so a full or closed channel is reported
//! as a sink failure instead of stalling the profiler between runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nemesis_core::ResultSink;
use nemesis_core::RunResult;
use nemesis_core::SinkError;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Result sink forwarding each run result over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    /// Channel sender.
    sender: Sender<RunResult>,
}

impl ChannelSink {
    /// Creates a sink sending into `sender`.
    #[must_use]
    pub const fn new(sender: Sender<RunResult>) -> Self {
        Self {
            sender,
        }
    }
}

impl ResultSink for ChannelSink {
    fn record(&self, result: &RunResult) -> Result<(), SinkError> {
        self.sender.try_send(result.clone()).map_err(|err| match err {
            TrySendError::Full(result) => {
                SinkError::Write(format!("channel full, dropped result for {}", result.operation))
            }
            TrySendError::Closed(_) => SinkError::Closed("channel receiver dropped".to_string()),
        })
    }
}
