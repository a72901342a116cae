// nemesis-core/src/runtime/traffic.rs
// ============================================================================
// Module: Traffic Actions
// Description: Role-specific actions repeated by workers.
// Purpose: Bind each worker role to one parameterized database action.
// Dependencies: crate::{core, interfaces}, rand
// ============================================================================

//! ## Overview
//! A worker is a loop around a single [`WorkerAction`]. [`TrafficProfile`]
//! builds the four standard actions against one target table keyed by an
//! integer `id`. [`RoleActions`] maps roles to actions and accepts custom
//! actions, which is how tests and alternate workloads plug in.
//!
//! Update, delete, and read actions pick a random key and report
//! [`BackendError::NoMatchingRow`] when nothing matched, so an empty table
//! yields recorded failures rather than silent successes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;

use crate::core::WorkerRole;
use crate::interfaces::BackendError;
use crate::interfaces::Connection;
use crate::runtime::names::random_name;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Action a worker repeats until told to stop.
pub type WorkerAction =
    Arc<dyn Fn(&mut dyn Connection, &mut StdRng) -> Result<(), BackendError> + Send + Sync>;

/// Default target table for generated traffic.
pub const DEFAULT_TABLE: &str = "users";

/// Default upper bound for randomly chosen row keys.
pub const DEFAULT_KEY_SPACE: u64 = 10_000;

// ============================================================================
// SECTION: Traffic Profile
// ============================================================================

/// Target table and key range for the standard actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficProfile {
    /// Target table name (a plain SQL identifier).
    table: String,
    /// Keys are drawn uniformly from `1..=key_space`.
    key_space: u64,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE, DEFAULT_KEY_SPACE)
    }
}

impl TrafficProfile {
    /// Creates a profile; a zero key space is raised to one.
    #[must_use]
    pub fn new(table: impl Into<String>, key_space: u64) -> Self {
        Self {
            table: table.into(),
            key_space: key_space.max(1),
        }
    }

    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the key space upper bound.
    #[must_use]
    pub const fn key_space(&self) -> u64 {
        self.key_space
    }

    /// Builds the standard action for `role`.
    #[must_use]
    pub fn action(&self, role: WorkerRole) -> WorkerAction {
        let table = self.table.clone();
        let key_space = self.key_space;
        match role {
            WorkerRole::Reader => worker_action(move |connection, rng| {
                let key = rng.gen_range(1 ..= key_space);
                let statement = format!("SELECT * FROM {table} WHERE id = {key}");
                require_row(connection.execute(&statement)?, &table, key)
            }),
            WorkerRole::Insert => worker_action(move |connection, rng| {
                let name = random_name(rng);
                let statement = format!("INSERT INTO {table} (name) VALUES ('{name}')");
                connection.execute(&statement).map(|_| ())
            }),
            WorkerRole::Update => worker_action(move |connection, rng| {
                let key = rng.gen_range(1 ..= key_space);
                let name = random_name(rng);
                let statement = format!("UPDATE {table} SET name = '{name}' WHERE id = {key}");
                require_row(connection.execute(&statement)?, &table, key)
            }),
            WorkerRole::Delete => worker_action(move |connection, rng| {
                let key = rng.gen_range(1 ..= key_space);
                let statement = format!("DELETE FROM {table} WHERE id = {key}");
                require_row(connection.execute(&statement)?, &table, key)
            }),
        }
    }

    /// Builds the standard action for every role.
    #[must_use]
    pub fn actions(&self) -> RoleActions {
        WorkerRole::ALL
            .into_iter()
            .fold(RoleActions::new(), |actions, role| actions.with_action(role, self.action(role)))
    }
}

/// Wraps a closure as a [`WorkerAction`].
#[must_use]
pub fn worker_action<F>(action: F) -> WorkerAction
where
    F: Fn(&mut dyn Connection, &mut StdRng) -> Result<(), BackendError> + Send + Sync + 'static,
{
    Arc::new(action)
}

/// Maps a zero row count to [`BackendError::NoMatchingRow`].
fn require_row(rows: u64, table: &str, key: u64) -> Result<(), BackendError> {
    if rows == 0 {
        return Err(BackendError::NoMatchingRow(format!("{table}.id = {key}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Role Actions
// ============================================================================

/// Action selected for each role at pool construction time.
#[derive(Clone, Default)]
pub struct RoleActions {
    /// Actions keyed by role.
    actions: BTreeMap<WorkerRole, WorkerAction>,
}

impl RoleActions {
    /// Creates an empty action map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the action for `role` replaced.
    #[must_use]
    pub fn with_action(mut self, role: WorkerRole, action: WorkerAction) -> Self {
        self.actions.insert(role, action);
        self
    }

    /// Uses the same closure for every role.
    #[must_use]
    pub fn uniform<F>(action: F) -> Self
    where
        F: Fn(&mut dyn Connection, &mut StdRng) -> Result<(), BackendError> + Send + Sync + 'static,
    {
        let action = worker_action(action);
        WorkerRole::ALL
            .into_iter()
            .fold(Self::new(), |actions, role| actions.with_action(role, Arc::clone(&action)))
    }

    /// Returns the action configured for `role`.
    #[must_use]
    pub fn get(&self, role: WorkerRole) -> Option<&WorkerAction> {
        self.actions.get(&role)
    }
}

impl fmt::Debug for RoleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleActions").field("roles", &self.actions.keys()).finish()
    }
}
