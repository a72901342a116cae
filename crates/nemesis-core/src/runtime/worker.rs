// nemesis-core/src/runtime/worker.rs
// ============================================================================
// Module: Worker
// Description: One thread repeating one action until told to stop.
// Purpose: Generate load and record every attempt as an outcome.
// Dependencies: crate::{core, interfaces, runtime::traffic}, rand, tracing
// ============================================================================

//! ## Overview
//! A [`Worker`] owns one exclusive connection for its lifetime. Each loop
//! iteration runs the action once, measures it, and appends an [`Outcome`].
//! Failed actions are recorded and the loop continues; only the stop flag,
//! checked at the iteration boundary, ends it.
//! Invariants:
//! - `Ready` is signalled after the first attempted action, success or not.
//! - `Stopped` is signalled exactly once, after the last append, even when
//!   the action panics.
//! - Appends to a sealed [`OutcomeLog`] are discarded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Sender;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use tracing::warn;

use crate::core::Outcome;
use crate::core::WorkerId;
use crate::interfaces::Backend;
use crate::runtime::traffic::WorkerAction;

// ============================================================================
// SECTION: Signals
// ============================================================================

/// Lifecycle notifications sent from workers to their pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSignal {
    /// The worker finished its first attempted action.
    Ready(WorkerId),
    /// The worker could not open its connection.
    ConnectFailed {
        /// Worker that failed.
        worker: WorkerId,
        /// Connect error description.
        error: String,
    },
    /// The worker left its loop and will record nothing further.
    Stopped(WorkerId),
}

// ============================================================================
// SECTION: Outcome Log
// ============================================================================

/// Mutable state behind an [`OutcomeLog`].
#[derive(Debug, Default)]
struct LogState {
    /// Recorded outcomes in attempt order.
    outcomes: Vec<Outcome>,
    /// Once set, appends are discarded.
    sealed: bool,
    /// Appends rejected after sealing.
    discarded: u64,
}

/// Append-only outcome buffer shared between a worker and its pool.
#[derive(Debug, Clone, Default)]
pub struct OutcomeLog {
    /// Shared log state.
    state: Arc<Mutex<LogState>>,
}

impl OutcomeLog {
    /// Locks the state, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an outcome; returns false when the log is sealed.
    pub fn append(&self, outcome: Outcome) -> bool {
        let mut state = self.lock();
        if state.sealed {
            state.discarded = state.discarded.saturating_add(1);
            return false;
        }
        state.outcomes.push(outcome);
        true
    }

    /// Takes every recorded outcome.
    pub fn take(&self) -> Vec<Outcome> {
        std::mem::take(&mut self.lock().outcomes)
    }

    /// Seals the log and takes the outcomes recorded so far.
    pub fn seal(&self) -> Vec<Outcome> {
        let mut state = self.lock();
        state.sealed = true;
        std::mem::take(&mut state.outcomes)
    }

    /// Returns the number of appends rejected after sealing.
    #[cfg(test)]
    pub fn discarded(&self) -> u64 {
        self.lock().discarded
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Sends `Stopped` when dropped, covering normal exit and unwinding.
struct StopAck {
    /// Worker being acknowledged.
    worker: WorkerId,
    /// Pool signal channel.
    signals: Sender<WorkerSignal>,
}

impl Drop for StopAck {
    fn drop(&mut self) {
        if self.signals.send(WorkerSignal::Stopped(self.worker)).is_err() {
            debug!(worker = %self.worker, "pool gone before stop acknowledgement");
        }
    }
}

/// One load-generating worker bound to a role action.
pub struct Worker {
    /// Worker identity.
    pub id: WorkerId,
    /// Backend used to open the worker's own connection.
    pub backend: Arc<dyn Backend>,
    /// Action repeated each iteration.
    pub action: WorkerAction,
    /// Shared run-start epoch.
    pub epoch: Instant,
    /// Stop flag shared with the pool.
    pub stop: Arc<AtomicBool>,
    /// Outcome buffer shared with the pool.
    pub log: OutcomeLog,
    /// Lifecycle signal channel.
    pub signals: Sender<WorkerSignal>,
}

impl Worker {
    /// Runs the worker loop until the stop flag is observed.
    pub fn run(self) {
        let _ack = StopAck {
            worker: self.id,
            signals: self.signals.clone(),
        };
        let mut connection = match self.backend.connect() {
            Ok(connection) => connection,
            Err(err) => {
                warn!(worker = %self.id, error = %err, "worker connect failed");
                let signal = WorkerSignal::ConnectFailed {
                    worker: self.id,
                    error: err.to_string(),
                };
                if self.signals.send(signal).is_err() {
                    debug!(worker = %self.id, "pool gone before connect failure report");
                }
                return;
            }
        };
        let mut rng = StdRng::from_entropy();
        let mut announced = false;
        while !self.stop.load(Ordering::Acquire) {
            let started = Instant::now();
            let offset = started.saturating_duration_since(self.epoch);
            let result = (self.action)(connection.as_mut(), &mut rng);
            let duration = started.elapsed();
            let outcome = match result {
                Ok(()) => Outcome::success(offset, duration),
                Err(err) => Outcome::failure(offset, duration, err.to_string()),
            };
            if !self.log.append(outcome) {
                break;
            }
            if !announced {
                announced = true;
                if self.signals.send(WorkerSignal::Ready(self.id)).is_err() {
                    break;
                }
            }
        }
        debug!(worker = %self.id, "worker loop exited");
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
