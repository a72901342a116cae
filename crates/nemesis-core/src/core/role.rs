// nemesis-core/src/core/role.rs
// ============================================================================
// Module: Worker Roles
// Description: Traffic roles and per-instance worker identifiers.
// Purpose: Name the kind of load a worker generates.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every worker repeats the action of exactly one [`WorkerRole`]. A
//! [`WorkerId`] pairs the role with the instance index inside that role and
//! names the worker thread, log events, and exported records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Worker Role
// ============================================================================

/// Kind of synthetic traffic a worker repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Reads a random row.
    Reader,
    /// Inserts a row with a random name.
    Insert,
    /// Updates a random existing row.
    Update,
    /// Deletes a random row.
    Delete,
}

impl WorkerRole {
    /// All roles in emission order.
    pub const ALL: [Self; 4] = [Self::Reader, Self::Insert, Self::Update, Self::Delete];

    /// Returns the stable lowercase label for the role.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Worker Identifier
// ============================================================================

/// Identifies one worker instance within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId {
    /// Role the worker was started for.
    pub role: WorkerRole,
    /// Zero-based index among the workers of the same role.
    pub index: usize,
}

impl WorkerId {
    /// Creates a worker identifier.
    #[must_use]
    pub const fn new(role: WorkerRole, index: usize) -> Self {
        Self {
            role,
            index,
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role, self.index)
    }
}
