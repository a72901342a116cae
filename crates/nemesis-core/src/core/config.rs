// nemesis-core/src/core/config.rs
// ============================================================================
// Module: Profiler Configuration
// Description: Worker counts per role and the start/teardown bounds.
// Purpose: Immutable run configuration consumed by the coordinator.
// Dependencies: crate::core::role
// ============================================================================

//! ## Overview
//! [`ProfilerConfig`] maps each [`WorkerRole`] to a worker count and carries
//! the two timeouts that bound otherwise unbounded waits. A count of zero
//! means the role takes no part in the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use crate::core::role::WorkerRole;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default bound on waiting for workers to start issuing requests.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(60);
/// Default bound on waiting for workers to acknowledge a stop signal.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Profiler Config
// ============================================================================

/// Worker counts and timeouts for a profiling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Configured worker count per role (zero counts are not stored).
    workers: BTreeMap<WorkerRole, usize>,
    /// Start barrier timeout.
    start_timeout: Duration,
    /// Teardown timeout.
    teardown_timeout: Duration,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            workers: BTreeMap::new(),
            start_timeout: DEFAULT_START_TIMEOUT,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
        }
    }
}

impl ProfilerConfig {
    /// Creates a config with no workers and the given timeouts.
    #[must_use]
    pub const fn new(start_timeout: Duration, teardown_timeout: Duration) -> Self {
        Self {
            workers: BTreeMap::new(),
            start_timeout,
            teardown_timeout,
        }
    }

    /// Returns a copy with the worker count for `role` replaced.
    #[must_use]
    pub fn with_workers(mut self, role: WorkerRole, count: usize) -> Self {
        if count == 0 {
            self.workers.remove(&role);
        } else {
            self.workers.insert(role, count);
        }
        self
    }

    /// Returns a copy with the start timeout replaced.
    #[must_use]
    pub const fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Returns a copy with the teardown timeout replaced.
    #[must_use]
    pub const fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Returns the number of workers configured for `role`.
    #[must_use]
    pub fn worker_count(&self, role: WorkerRole) -> usize {
        self.workers.get(&role).copied().unwrap_or(0)
    }

    /// Returns the total number of workers across all roles.
    #[must_use]
    pub fn total_workers(&self) -> usize {
        self.workers.values().fold(0usize, |acc, count| acc.saturating_add(*count))
    }

    /// Iterates the roles with a non-zero worker count, in role order.
    pub fn active_roles(&self) -> impl Iterator<Item = (WorkerRole, usize)> + '_ {
        self.workers.iter().map(|(role, count)| (*role, *count))
    }

    /// Returns the start barrier timeout.
    #[must_use]
    pub const fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    /// Returns the teardown timeout.
    #[must_use]
    pub const fn teardown_timeout(&self) -> Duration {
        self.teardown_timeout
    }
}
