// nemesis-core/src/runtime/pool.rs
// ============================================================================
// Module: Worker Pool
// Description: Starts, observes, and stops the workers of one run.
// Purpose: Enforce the start barrier and the bounded teardown.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`WorkerPool`] launches one thread per configured worker instance and
//! tracks their lifecycle signals. [`WorkerPool::await_ready`] waits, bounded
//! by the start timeout, until every worker attempted its first action.
//! [`WorkerPool::stop`] raises the stop flag and waits, bounded by the
//! teardown timeout, for acknowledgements.
//! Invariants:
//! - Exactly `config.worker_count(role)` workers are started per role.
//! - Every started worker is signalled to stop, even when the pool is
//!   dropped without calling [`WorkerPool::stop`].
//! - Workers that miss the teardown deadline are detached, never joined;
//!   their logs are sealed so nothing is recorded after collection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::ProfilerConfig;
use crate::core::StartBarrier;
use crate::core::WorkerId;
use crate::core::WorkerOutcomes;
use crate::core::WorkerRole;
use crate::interfaces::Backend;
use crate::runtime::traffic::RoleActions;
use crate::runtime::worker::OutcomeLog;
use crate::runtime::worker::Worker;
use crate::runtime::worker::WorkerSignal;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Worker pool startup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A role with workers has no action configured.
    #[error("no action configured for role {0}")]
    MissingAction(WorkerRole),
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker {worker}: {message}")]
    Spawn {
        /// Worker that could not be launched.
        worker: WorkerId,
        /// Spawn error description.
        message: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pool-side handle to one worker thread.
struct WorkerHandle {
    /// Worker identity.
    id: WorkerId,
    /// Outcome buffer shared with the worker.
    log: OutcomeLog,
    /// Join handle, taken when the worker is joined.
    thread: Option<JoinHandle<()>>,
}

/// Outcomes collected by [`WorkerPool::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    /// Workers that did not acknowledge the stop signal in time.
    pub stuck: Vec<WorkerId>,
    /// Outcomes per worker, in launch order.
    pub workers: Vec<WorkerOutcomes>,
}

impl StopReport {
    /// Returns true when every worker stopped in time.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stuck.is_empty()
    }
}

// ============================================================================
// SECTION: Worker Pool
// ============================================================================

/// Running workers of one measured run.
pub struct WorkerPool {
    /// Handles in launch order.
    handles: Vec<WorkerHandle>,
    /// Stop flag shared with every worker.
    stop: Arc<AtomicBool>,
    /// Lifecycle signals from every worker.
    signals: Receiver<WorkerSignal>,
    /// Workers that attempted at least one action.
    ready: BTreeSet<WorkerId>,
    /// Workers whose connection could not be opened.
    connect_failed: BTreeMap<WorkerId, String>,
    /// Workers that acknowledged the stop signal.
    stopped: BTreeSet<WorkerId>,
}

impl WorkerPool {
    /// Launches the configured workers, all sharing `epoch`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] when a role lacks an action or a thread cannot
    /// be spawned. Workers already launched are stopped before returning.
    pub fn start(
        backend: &Arc<dyn Backend>,
        config: &ProfilerConfig,
        actions: &RoleActions,
        epoch: Instant,
    ) -> Result<Self, PoolError> {
        let (sender, receiver) = mpsc::channel();
        let mut pool = Self {
            handles: Vec::with_capacity(config.total_workers()),
            stop: Arc::new(AtomicBool::new(false)),
            signals: receiver,
            ready: BTreeSet::new(),
            connect_failed: BTreeMap::new(),
            stopped: BTreeSet::new(),
        };
        for (role, count) in config.active_roles() {
            let Some(action) = actions.get(role) else {
                Self::abandon(pool, config.teardown_timeout());
                return Err(PoolError::MissingAction(role));
            };
            for index in 0 .. count {
                let id = WorkerId::new(role, index);
                let log = OutcomeLog::default();
                let worker = Worker {
                    id,
                    backend: Arc::clone(backend),
                    action: Arc::clone(action),
                    epoch,
                    stop: Arc::clone(&pool.stop),
                    log: log.clone(),
                    signals: sender.clone(),
                };
                let spawned = thread::Builder::new()
                    .name(format!("nemesis-{id}"))
                    .spawn(move || worker.run());
                match spawned {
                    Ok(thread) => pool.handles.push(WorkerHandle {
                        id,
                        log,
                        thread: Some(thread),
                    }),
                    Err(err) => {
                        Self::abandon(pool, config.teardown_timeout());
                        return Err(PoolError::Spawn {
                            worker: id,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        info!(workers = pool.handles.len(), "worker pool started");
        Ok(pool)
    }

    /// Returns the number of launched workers.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.handles.len()
    }

    /// Returns the number of launched workers for `role`.
    #[must_use]
    pub fn spawned_for(&self, role: WorkerRole) -> usize {
        self.handles.iter().filter(|handle| handle.id.role == role).count()
    }

    /// Waits until every worker attempted an action or failed to connect,
    /// bounded by `timeout`. Elapsing the timeout is not an error.
    pub fn await_ready(&mut self, timeout: Duration) -> StartBarrier {
        let expected = self.handles.len();
        if expected == 0 {
            return StartBarrier::NotRequired;
        }
        let deadline = Instant::now().checked_add(timeout);
        while self.ready.len().saturating_add(self.connect_failed.len()) < expected {
            match self.next_signal(deadline) {
                Some(signal) => self.absorb(signal),
                None => break,
            }
        }
        self.drain();
        let ready = self.ready.len();
        if ready >= expected {
            StartBarrier::Confirmed
        } else {
            StartBarrier::Degraded {
                ready,
                expected,
            }
        }
    }

    /// Signals every worker to stop and collects their outcomes. Workers
    /// that do not acknowledge within `timeout` are reported as stuck.
    #[must_use]
    pub fn stop(mut self, timeout: Duration) -> StopReport {
        self.stop.store(true, Ordering::Release);
        let deadline = Instant::now().checked_add(timeout);
        while self.stopped.len() < self.handles.len() {
            match self.next_signal(deadline) {
                Some(signal) => self.absorb(signal),
                None => break,
            }
        }
        self.drain();
        let mut stuck = Vec::new();
        let mut workers = Vec::with_capacity(self.handles.len());
        for mut handle in std::mem::take(&mut self.handles) {
            let outcomes = if self.stopped.contains(&handle.id) {
                if let Some(thread) = handle.thread.take()
                    && thread.join().is_err()
                {
                    warn!(worker = %handle.id, "worker thread panicked");
                }
                handle.log.take()
            } else {
                error!(worker = %handle.id, "worker did not stop before the teardown timeout");
                stuck.push(handle.id);
                handle.log.seal()
            };
            workers.push(WorkerOutcomes {
                worker: handle.id,
                outcomes,
            });
        }
        info!(workers = workers.len(), stuck = stuck.len(), "worker pool stopped");
        StopReport {
            stuck,
            workers,
        }
    }

    /// Stops a partially started pool, discarding its outcomes.
    fn abandon(pool: Self, timeout: Duration) {
        let report = pool.stop(timeout);
        debug!(stuck = report.stuck.len(), "abandoned partially started pool");
    }

    /// Receives the next signal, or `None` once `deadline` passes. A deadline
    /// that overflowed blocks until a signal arrives.
    fn next_signal(&self, deadline: Option<Instant>) -> Option<WorkerSignal> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return None;
                }
                self.signals.recv_timeout(remaining).ok()
            }
            None => self.signals.recv().ok(),
        }
    }

    /// Absorbs signals that are already queued.
    fn drain(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            self.absorb(signal);
        }
    }

    /// Applies one lifecycle signal.
    fn absorb(&mut self, signal: WorkerSignal) {
        match signal {
            WorkerSignal::Ready(worker) => {
                debug!(worker = %worker, "worker ready");
                self.ready.insert(worker);
            }
            WorkerSignal::ConnectFailed {
                worker,
                error,
            } => {
                self.connect_failed.insert(worker, error);
            }
            WorkerSignal::Stopped(worker) => {
                self.stopped.insert(worker);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}
