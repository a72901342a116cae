// nemesis-core/src/runtime/sink.rs
// ============================================================================
// Module: In-Memory Result Sink
// Description: Result sink that keeps run results in memory.
// Purpose: Collect results for tests and in-process consumers.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryResultSink`] clones each recorded [`RunResult`] into a shared
//! vector. Clones share the same storage, so a caller can hand one clone to
//! the profiler and read results through another.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::RunResult;
use crate::interfaces::ResultSink;
use crate::interfaces::SinkError;

// ============================================================================
// SECTION: In-Memory Sink
// ============================================================================

/// Result sink storing every recorded result in emission order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultSink {
    /// Recorded results.
    results: Arc<Mutex<Vec<RunResult>>>,
}

impl InMemoryResultSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded results.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the result mutex is poisoned.
    pub fn results(&self) -> Result<Vec<RunResult>, SinkError> {
        let guard = self
            .results
            .lock()
            .map_err(|_| SinkError::Closed("in-memory sink lock poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

impl ResultSink for InMemoryResultSink {
    fn record(&self, result: &RunResult) -> Result<(), SinkError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|_| SinkError::Closed("in-memory sink lock poisoned".to_string()))?;
        guard.push(result.clone());
        Ok(())
    }
}
