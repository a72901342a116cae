// nemesis-core/tests/common/mod.rs
// ============================================================================
// Module: Test Support
// Description: Scripted in-memory backend and catalog helpers.
// Purpose: Exercise the profiler without a real database.
// Dependencies: nemesis-core
// ============================================================================

//! ## Overview
//! [`ScriptedBackend`] records every statement executed through its
//! connections, tracks open connections, and follows a connect script that
//! can delay or fail individual connects.

use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use nemesis_core::Backend;
use nemesis_core::BackendError;
use nemesis_core::CatalogOperation;
use nemesis_core::Connection;
use nemesis_core::Feature;
use nemesis_core::ProfilerConfig;
use nemesis_core::RoleActions;
use nemesis_core::WorkerRole;

// ============================================================================
// SECTION: Scripted Backend
// ============================================================================

/// One scripted connect attempt.
#[derive(Debug, Clone, Copy)]
pub enum ConnectStep {
    /// Connect immediately.
    Ok,
    /// Sleep, then connect.
    Delay(Duration),
    /// Fail the connect.
    Fail,
}

/// Shared counters and statement log.
#[derive(Debug, Default)]
pub struct BackendState {
    /// Statements executed by any connection, in order.
    pub statements: Mutex<Vec<String>>,
    /// Connect attempts.
    pub connects: AtomicUsize,
    /// Connections currently open.
    pub open: AtomicUsize,
}

/// In-memory backend with scripted connects.
pub struct ScriptedBackend {
    /// Supported features.
    features: BTreeSet<Feature>,
    /// Remaining connect steps; connects beyond the script succeed.
    script: Mutex<VecDeque<ConnectStep>>,
    /// Row count reported by every statement.
    rows: u64,
    /// Shared state.
    pub state: Arc<BackendState>,
}

impl ScriptedBackend {
    /// Backend supporting no features.
    pub fn new() -> Self {
        Self {
            features: BTreeSet::new(),
            script: Mutex::new(VecDeque::new()),
            rows: 1,
            state: Arc::new(BackendState::default()),
        }
    }

    /// Adds a supported feature.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    /// Replaces the connect script.
    pub fn with_script(self, steps: &[ConnectStep]) -> Self {
        *self.script.lock().unwrap() = steps.iter().copied().collect();
        self
    }

    /// Sets the row count every statement reports.
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    /// Returns the statements executed so far.
    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }

    /// Returns the number of connect attempts so far.
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Returns the number of open connections.
    pub fn open_connections(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(ConnectStep::Ok);
        match step {
            ConnectStep::Ok => {}
            ConnectStep::Delay(delay) => thread::sleep(delay),
            ConnectStep::Fail => {
                return Err(BackendError::Connect("scripted connect failure".to_string()));
            }
        }
        self.state.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            rows: self.rows,
            state: Arc::clone(&self.state),
        }))
    }

    fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Connection logging statements into the backend state.
pub struct ScriptedConnection {
    /// Row count reported by every statement.
    rows: u64,
    /// Shared state.
    state: Arc<BackendState>,
}

impl Connection for ScriptedConnection {
    fn execute(&mut self, statement: &str) -> Result<u64, BackendError> {
        self.state.statements.lock().unwrap().push(statement.to_string());
        if statement.starts_with("FAIL") {
            return Err(BackendError::Statement(statement.to_string()));
        }
        Ok(self.rows)
    }

    fn execute_batch(&mut self, statements: &str) -> Result<(), BackendError> {
        self.execute(statements).map(|_| ())
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.state.open.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config with generous timeouts and the given worker counts.
pub fn config_with(counts: &[(WorkerRole, usize)]) -> ProfilerConfig {
    counts.iter().fold(
        ProfilerConfig::new(Duration::from_secs(5), Duration::from_secs(5)),
        |config, (role, count)| config.with_workers(*role, *count),
    )
}

/// Actions that sleep briefly and succeed without touching the connection.
pub fn idle_actions() -> RoleActions {
    RoleActions::uniform(|_connection, _rng| {
        thread::sleep(Duration::from_millis(1));
        Ok(())
    })
}

/// Actions that sleep briefly and always fail.
pub fn failing_actions() -> RoleActions {
    RoleActions::uniform(|_connection, _rng| {
        thread::sleep(Duration::from_millis(1));
        Err(BackendError::NoMatchingRow("users.id = 1".to_string()))
    })
}

/// Operation whose phases log `prepare <name>`, `perform <name>`, and
/// `cleanup <name>`; perform lasts `hold`.
pub fn logged_operation(name: &str, hold: Duration) -> CatalogOperation {
    let prepare = format!("prepare {name}");
    let perform = format!("perform {name}");
    let cleanup = format!("cleanup {name}");
    CatalogOperation::new(name, move |connection| {
        connection.execute(&perform)?;
        thread::sleep(hold);
        Ok(())
    })
    .with_prepare(move |connection| connection.execute(&prepare).map(|_| ()))
    .with_cleanup(move |connection| connection.execute(&cleanup).map(|_| ()))
}

/// Operation with only a perform phase that lasts `hold`.
pub fn perform_only(name: &str, hold: Duration) -> CatalogOperation {
    CatalogOperation::new(name, move |_connection| {
        thread::sleep(hold);
        Ok(())
    })
}
