// nemesis-core/src/interfaces/mod.rs
// ============================================================================
// Module: Nemesis Interfaces
// Description: Backend-agnostic contracts for databases and result sinks.
// Purpose: Define the narrow capability set the profiling engine consumes.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The engine never inspects SQL dialects. It opens connections, executes
//! statements, and asks which features a backend supports. Finished runs are
//! handed to a [`ResultSink`]. Concrete adapters live in separate crates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::RunResult;

// ============================================================================
// SECTION: Features
// ============================================================================

/// Backend capability flags used to gate catalog operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Named table constraints can be added and dropped after creation.
    ColumnConstraints,
    /// Text columns accept default values.
    DefaultValueForText,
    /// A table may carry more than one auto-increment column.
    MultipleAutoIncrementColumns,
    /// Indexes can be renamed in place.
    RenameIndex,
    /// Several tables can be renamed in one transaction.
    RenameTableInOneTx,
    /// Column data types can be changed in place.
    ModifyDatatype,
    /// Indexes can be created invisible to the planner.
    InvisibleIndex,
    /// Indexes can be built without blocking writes.
    OnlineIndex,
    /// Computed (virtual) columns can be added.
    VirtualColumn,
}

impl Feature {
    /// All features in declaration order.
    pub const ALL: [Self; 9] = [
        Self::ColumnConstraints,
        Self::DefaultValueForText,
        Self::MultipleAutoIncrementColumns,
        Self::RenameIndex,
        Self::RenameTableInOneTx,
        Self::ModifyDatatype,
        Self::InvisibleIndex,
        Self::OnlineIndex,
        Self::VirtualColumn,
    ];

    /// Returns the stable snake-case label for the feature.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ColumnConstraints => "column_constraints",
            Self::DefaultValueForText => "default_value_for_text",
            Self::MultipleAutoIncrementColumns => "multiple_auto_increment_columns",
            Self::RenameIndex => "rename_index",
            Self::RenameTableInOneTx => "rename_table_in_one_tx",
            Self::ModifyDatatype => "modify_datatype",
            Self::InvisibleIndex => "invisible_index",
            Self::OnlineIndex => "online_index",
            Self::VirtualColumn => "virtual_column",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Errors reported by backends and connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// A connection could not be opened.
    #[error("backend connect error: {0}")]
    Connect(String),
    /// A statement failed to execute.
    #[error("backend statement error: {0}")]
    Statement(String),
    /// A statement matched no rows where one was required.
    #[error("no matching row: {0}")]
    NoMatchingRow(String),
}

/// One exclusive database session.
pub trait Connection: Send {
    /// Executes a single statement and returns the number of rows it
    /// affected or returned.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the statement fails.
    fn execute(&mut self, statement: &str) -> Result<u64, BackendError>;

    /// Executes several semicolon-separated statements without results.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when any statement fails.
    fn execute_batch(&mut self, statements: &str) -> Result<(), BackendError>;
}

/// Database engine adapter shared by the coordinator and every worker.
pub trait Backend: Send + Sync {
    /// Returns a short backend label (for example `sqlite`).
    fn name(&self) -> &str;

    /// Opens a new exclusive connection.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Connect`] when the connection cannot be opened.
    fn connect(&self) -> Result<Box<dyn Connection>, BackendError>;

    /// Returns true when the backend supports `feature`.
    fn supports(&self, feature: Feature) -> bool;
}

// ============================================================================
// SECTION: Result Sink
// ============================================================================

/// Result sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the underlying output failed.
    #[error("sink write failed: {0}")]
    Write(String),
    /// A record could not be serialized.
    #[error("sink serialization failed: {0}")]
    Serialize(String),
    /// The sink can no longer accept results.
    #[error("sink closed: {0}")]
    Closed(String),
}

/// Ordered, durable recording of run results.
pub trait ResultSink: Send + Sync {
    /// Records one run result, including every outcome it holds.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the result cannot be recorded.
    fn record(&self, result: &RunResult) -> Result<(), SinkError>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when buffered output cannot be written.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
