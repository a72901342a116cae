// nemesis-core/src/runtime/profiler.rs
// ============================================================================
// Module: Profiler
// Description: Run coordinator for catalogued schema operations.
// Purpose: Execute prepare, load, perform, teardown, and cleanup per operation.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`Profiler::run_operation`] executes one measured run on the calling
//! thread. [`Profiler::profile`] repeats it for every catalog operation,
//! strictly one after another, and hands each [`RunResult`] to a
//! [`ResultSink`].
//! Invariants:
//! - Phases run in order: feature check, prepare, start load, perform, stop
//!   load, cleanup.
//! - A phase failure becomes a [`RunStatus`] and [`AbortReason`]; it never
//!   ends the session.
//! - Cleanup runs whenever prepare succeeded, including after a failed
//!   perform or a teardown timeout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::AbortReason;
use crate::core::Catalog;
use crate::core::CatalogOperation;
use crate::core::PerformWindow;
use crate::core::ProfilerConfig;
use crate::core::RunResult;
use crate::core::RunStatus;
use crate::core::StartBarrier;
use crate::core::WorkerOutcomes;
use crate::core::WorkerRole;
use crate::interfaces::Backend;
use crate::interfaces::Connection;
use crate::interfaces::ResultSink;
use crate::runtime::pool::WorkerPool;
use crate::runtime::summary::RunSummary;
use crate::runtime::summary::summarize;
use crate::runtime::traffic::RoleActions;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Profiler construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfilerError {
    /// A role with configured workers has no action.
    #[error("no action configured for role {0}")]
    MissingAction(WorkerRole),
}

// ============================================================================
// SECTION: Session Report
// ============================================================================

/// Sink failure observed while emitting results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    /// Operation whose result was being recorded; `None` for the final flush.
    pub operation: Option<String>,
    /// Sink error description.
    pub error: String,
}

/// Totals for one profiling session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    /// Runs that completed.
    pub completed: usize,
    /// Runs skipped for unsupported features.
    pub skipped: usize,
    /// Runs aborted by a phase failure or teardown timeout.
    pub aborted: usize,
    /// Per-run summaries in catalog order.
    pub runs: Vec<RunSummary>,
    /// Results the sink failed to record.
    pub sink_failures: Vec<SinkFailure>,
}

impl SessionReport {
    /// Counts one finished run.
    fn note(&mut self, result: &RunResult) {
        match result.status {
            RunStatus::Completed => self.completed = self.completed.saturating_add(1),
            RunStatus::Skipped => self.skipped = self.skipped.saturating_add(1),
            RunStatus::Aborted => self.aborted = self.aborted.saturating_add(1),
        }
        self.runs.push(summarize(result));
    }

    /// Returns the number of runs in the session.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed.saturating_add(self.skipped).saturating_add(self.aborted)
    }
}

// ============================================================================
// SECTION: Profiler
// ============================================================================

/// Run coordinator bound to one backend and worker configuration.
pub struct Profiler {
    /// Backend shared by the coordinator and every worker.
    backend: Arc<dyn Backend>,
    /// Worker counts and timeouts.
    config: ProfilerConfig,
    /// Action per role.
    actions: RoleActions,
}

impl Profiler {
    /// Creates a profiler.
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::MissingAction`] when a role with workers has
    /// no action in `actions`.
    pub fn new(
        backend: Arc<dyn Backend>,
        config: ProfilerConfig,
        actions: RoleActions,
    ) -> Result<Self, ProfilerError> {
        let missing = config.active_roles().find(|(role, _)| actions.get(*role).is_none());
        if let Some((role, _)) = missing {
            return Err(ProfilerError::MissingAction(role));
        }
        Ok(Self {
            backend,
            config,
            actions,
        })
    }

    /// Returns the worker configuration.
    #[must_use]
    pub const fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Runs every catalog operation in order, recording each result.
    pub fn profile(&self, catalog: &Catalog, sink: &dyn ResultSink) -> SessionReport {
        info!(
            catalog = catalog.name(),
            operations = catalog.len(),
            backend = self.backend.name(),
            workers = self.config.total_workers(),
            "profiling session started"
        );
        let mut report = SessionReport::default();
        for operation in catalog.operations() {
            let result = self.run_operation(operation);
            report.note(&result);
            if let Err(err) = sink.record(&result) {
                error!(operation = %result.operation, error = %err, "result sink failed");
                report.sink_failures.push(SinkFailure {
                    operation: Some(result.operation.clone()),
                    error: err.to_string(),
                });
            }
        }
        if let Err(err) = sink.flush() {
            error!(error = %err, "result sink flush failed");
            report.sink_failures.push(SinkFailure {
                operation: None,
                error: err.to_string(),
            });
        }
        info!(
            completed = report.completed,
            skipped = report.skipped,
            aborted = report.aborted,
            "profiling session finished"
        );
        report
    }

    /// Runs one operation through every phase and returns its result.
    #[must_use]
    pub fn run_operation(&self, operation: &CatalogOperation) -> RunResult {
        let name = operation.name();
        if !operation.is_supported_by(self.backend.as_ref()) {
            info!(operation = name, "operation unsupported by backend, skipped");
            return RunResult::skipped(name);
        }

        let mut connection = match self.backend.connect() {
            Ok(connection) => connection,
            Err(err) => {
                error!(operation = name, error = %err, "coordinator connect failed");
                return RunResult::aborted(name, AbortReason::Connect(err.to_string()));
            }
        };

        info!(operation = name, "prepare");
        if let Err(err) = operation.prepare(connection.as_mut()) {
            error!(operation = name, error = %err, "prepare failed, run aborted");
            return RunResult::aborted(name, AbortReason::Prepare(err.to_string()));
        }

        let epoch = Instant::now();
        let mut pool = match WorkerPool::start(&self.backend, &self.config, &self.actions, epoch) {
            Ok(pool) => pool,
            Err(err) => {
                error!(operation = name, error = %err, "worker pool failed to start, run aborted");
                let mut result = RunResult::aborted(name, AbortReason::Spawn(err.to_string()));
                result.cleanup_error = run_cleanup(operation, connection.as_mut());
                return result;
            }
        };
        let barrier = pool.await_ready(self.config.start_timeout());
        if let StartBarrier::Degraded {
            ready,
            expected,
        } = barrier
        {
            warn!(
                operation = name,
                ready,
                expected,
                "start timeout elapsed before every worker was active"
            );
        }

        info!(operation = name, "perform");
        let perform_start = epoch.elapsed();
        let performed = operation.perform(connection.as_mut());
        let perform_end = epoch.elapsed();

        let report = pool.stop(self.config.teardown_timeout());
        let abort_reason = match performed {
            Err(err) => {
                error!(operation = name, error = %err, "perform failed, run aborted");
                Some(AbortReason::Perform(err.to_string()))
            }
            Ok(()) if !report.is_clean() => {
                error!(
                    operation = name,
                    stuck = report.stuck.len(),
                    "teardown timeout elapsed, run aborted"
                );
                Some(AbortReason::Teardown(report.stuck.clone()))
            }
            Ok(()) => None,
        };

        info!(operation = name, "cleanup");
        let cleanup_error = run_cleanup(operation, connection.as_mut());

        let mut roles: BTreeMap<WorkerRole, Vec<WorkerOutcomes>> = BTreeMap::new();
        for worker in report.workers {
            roles.entry(worker.worker.role).or_default().push(worker);
        }
        let status =
            if abort_reason.is_some() { RunStatus::Aborted } else { RunStatus::Completed };
        info!(operation = name, status = %status, "run finished");
        RunResult {
            operation: name.to_string(),
            status,
            abort_reason,
            start_barrier: Some(barrier),
            perform_window: Some(PerformWindow {
                start: perform_start,
                end: perform_end,
            }),
            cleanup_error,
            stuck_workers: report.stuck,
            roles,
        }
    }
}

/// Runs cleanup and returns the failure message, if any.
fn run_cleanup(operation: &CatalogOperation, connection: &mut dyn Connection) -> Option<String> {
    match operation.cleanup(connection) {
        Ok(()) => None,
        Err(err) => {
            warn!(operation = operation.name(), error = %err, "cleanup failed");
            Some(err.to_string())
        }
    }
}
