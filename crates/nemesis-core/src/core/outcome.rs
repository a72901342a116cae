// nemesis-core/src/core/outcome.rs
// ============================================================================
// Module: Run Outcomes
// Description: Per-attempt outcomes and per-operation run results.
// Purpose: Capture what workers observed while a schema operation ran.
// Dependencies: crate::core::role, serde
// ============================================================================

//! ## Overview
//! Every worker attempt produces one [`Outcome`] stamped with its offset from
//! the run-start epoch. A [`RunResult`] groups the outcomes of one catalog
//! operation by role and worker together with the run status.
//! Invariants:
//! - Outcomes within one [`WorkerOutcomes`] are ordered by offset.
//! - A skipped run holds no outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::role::WorkerId;
use crate::core::role::WorkerRole;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of a single worker action attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Attempt start, relative to the run-start epoch.
    pub offset: Duration,
    /// Time spent inside the action.
    pub duration: Duration,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error description for failed attempts.
    pub error: Option<String>,
}

impl Outcome {
    /// Builds a successful outcome.
    #[must_use]
    pub const fn success(offset: Duration, duration: Duration) -> Self {
        Self {
            offset,
            duration,
            success: true,
            error: None,
        }
    }

    /// Builds a failed outcome carrying the error description.
    #[must_use]
    pub fn failure(offset: Duration, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            offset,
            duration,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcomes recorded by one worker instance, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcomes {
    /// Worker that produced the outcomes.
    pub worker: WorkerId,
    /// Recorded outcomes.
    pub outcomes: Vec<Outcome>,
}

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Final status of one operation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// All phases ran and every worker stopped in time.
    Completed,
    /// The backend lacks a feature the operation requires.
    Skipped,
    /// A setup, measured, or teardown failure ended the run.
    Aborted,
}

impl RunStatus {
    /// Returns the stable lowercase label for the status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    /// The coordinator connection could not be opened.
    Connect(String),
    /// The prepare phase failed.
    Prepare(String),
    /// Worker threads could not be launched.
    Spawn(String),
    /// The measured perform phase failed.
    Perform(String),
    /// Workers did not acknowledge the stop signal in time.
    Teardown(Vec<WorkerId>),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(message) => write!(f, "connect failed: {message}"),
            Self::Prepare(message) => write!(f, "prepare failed: {message}"),
            Self::Spawn(message) => write!(f, "worker spawn failed: {message}"),
            Self::Perform(message) => write!(f, "perform failed: {message}"),
            Self::Teardown(stuck) => {
                let names: Vec<String> = stuck.iter().map(ToString::to_string).collect();
                write!(f, "workers did not stop in time: {}", names.join(", "))
            }
        }
    }
}

/// Result of waiting for workers to start issuing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StartBarrier {
    /// The run had no workers to wait for.
    NotRequired,
    /// Every worker attempted an action before the start timeout.
    Confirmed,
    /// The timeout elapsed first; the run continued with reduced confidence.
    Degraded {
        /// Workers that had attempted an action.
        ready: usize,
        /// Workers that were launched.
        expected: usize,
    },
}

impl StartBarrier {
    /// Returns true when the barrier did not confirm every worker.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

impl fmt::Display for StartBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => f.write_str("not_required"),
            Self::Confirmed => f.write_str("confirmed"),
            Self::Degraded {
                ready,
                expected,
            } => write!(f, "degraded ({ready}/{expected} ready)"),
        }
    }
}

/// Offsets bracketing the measured perform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformWindow {
    /// Offset at which perform was invoked.
    pub start: Duration,
    /// Offset at which perform returned.
    pub end: Duration,
}

impl PerformWindow {
    /// Returns the wall-clock span of the perform call.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Returns true when `offset` falls inside the window.
    #[must_use]
    pub fn contains(&self, offset: Duration) -> bool {
        offset >= self.start && offset <= self.end
    }
}

// ============================================================================
// SECTION: Run Result
// ============================================================================

/// Aggregate result of running one catalog operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Operation name.
    pub operation: String,
    /// Final status.
    pub status: RunStatus,
    /// Abort cause when `status` is [`RunStatus::Aborted`].
    pub abort_reason: Option<AbortReason>,
    /// Start barrier outcome when load was started.
    pub start_barrier: Option<StartBarrier>,
    /// Offsets bracketing the perform call when it ran.
    pub perform_window: Option<PerformWindow>,
    /// Cleanup failure message (does not change the status).
    pub cleanup_error: Option<String>,
    /// Workers still running when the teardown timeout elapsed.
    pub stuck_workers: Vec<WorkerId>,
    /// Worker outcomes grouped by role.
    pub roles: BTreeMap<WorkerRole, Vec<WorkerOutcomes>>,
}

impl RunResult {
    /// Builds the result for an operation the backend cannot express.
    #[must_use]
    pub fn skipped(operation: impl Into<String>) -> Self {
        Self::empty(operation, RunStatus::Skipped, None)
    }

    /// Builds the result for a run aborted before load started.
    #[must_use]
    pub fn aborted(operation: impl Into<String>, reason: AbortReason) -> Self {
        Self::empty(operation, RunStatus::Aborted, Some(reason))
    }

    /// Builds a result with no outcomes.
    fn empty(
        operation: impl Into<String>,
        status: RunStatus,
        abort_reason: Option<AbortReason>,
    ) -> Self {
        Self {
            operation: operation.into(),
            status,
            abort_reason,
            start_barrier: None,
            perform_window: None,
            cleanup_error: None,
            stuck_workers: Vec::new(),
            roles: BTreeMap::new(),
        }
    }

    /// Returns the number of workers that contributed outcomes for `role`.
    #[must_use]
    pub fn worker_count(&self, role: WorkerRole) -> usize {
        self.roles.get(&role).map_or(0, Vec::len)
    }

    /// Iterates every outcome recorded for `role`.
    pub fn outcomes_for(&self, role: WorkerRole) -> impl Iterator<Item = &Outcome> + '_ {
        self.roles
            .get(&role)
            .into_iter()
            .flat_map(|workers| workers.iter().flat_map(|worker| worker.outcomes.iter()))
    }

    /// Returns the number of outcomes across all roles.
    #[must_use]
    pub fn total_outcomes(&self) -> usize {
        self.roles
            .values()
            .flat_map(|workers| workers.iter())
            .fold(0usize, |acc, worker| acc.saturating_add(worker.outcomes.len()))
    }

    /// Flattens the result into export records, grouped by role and ordered
    /// by offset within each role.
    #[must_use]
    pub fn records(&self) -> Vec<OutcomeRecord> {
        let mut records = Vec::with_capacity(self.total_outcomes());
        for (role, workers) in &self.roles {
            let start = records.len();
            for worker in workers {
                for outcome in &worker.outcomes {
                    records.push(OutcomeRecord {
                        operation: self.operation.clone(),
                        status: self.status,
                        role: *role,
                        worker: worker.worker.index,
                        offset_us: duration_to_us(outcome.offset),
                        duration_us: duration_to_us(outcome.duration),
                        success: outcome.success,
                        error: outcome.error.clone(),
                    });
                }
            }
            if let Some(slice) = records.get_mut(start ..) {
                slice.sort_by_key(|record| record.offset_us);
            }
        }
        records
    }
}

// ============================================================================
// SECTION: Export Record
// ============================================================================

/// Flattened outcome row used by persistent sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Operation name.
    pub operation: String,
    /// Final status of the run the record belongs to.
    pub status: RunStatus,
    /// Worker role.
    pub role: WorkerRole,
    /// Worker index within the role.
    pub worker: usize,
    /// Attempt offset from the run-start epoch, in microseconds.
    pub offset_us: u64,
    /// Attempt duration, in microseconds.
    pub duration_us: u64,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error text for failed attempts.
    pub error: Option<String>,
}

/// Converts a duration to whole microseconds, saturating on overflow.
#[must_use]
pub fn duration_to_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
