// nemesis-core/tests/profiler/session_tests.rs
// ============================================================================
// Module: Session Tests
// Description: Catalog-wide profiling sessions and result emission.
// Purpose: Validate sequential runs, sink emission, and failure isolation.
// Dependencies: nemesis-core
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use nemesis_core::Catalog;
use nemesis_core::CatalogOperation;
use nemesis_core::Feature;
use nemesis_core::InMemoryResultSink;
use nemesis_core::Profiler;
use nemesis_core::ResultSink;
use nemesis_core::RoleActions;
use nemesis_core::RunResult;
use nemesis_core::RunStatus;
use nemesis_core::SinkError;
use nemesis_core::WorkerRole;

use super::common::ScriptedBackend;
use super::common::config_with;
use super::common::idle_actions;
use super::common::logged_operation;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sink that rejects every record and flush.
struct RejectingSink {
    /// Record attempts.
    attempts: AtomicUsize,
}

impl ResultSink for RejectingSink {
    fn record(&self, _result: &RunResult) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Write("disk full".to_string()))
    }

    fn flush(&self) -> Result<(), SinkError> {
        Err(SinkError::Write("disk full".to_string()))
    }
}

/// Catalog mixing completed, skipped, and aborted operations.
fn mixed_catalog() -> Catalog {
    Catalog::new(
        "mixed",
        vec![
            logged_operation("first", Duration::ZERO),
            logged_operation("unsupported", Duration::ZERO).requires(Feature::InvisibleIndex),
            CatalogOperation::new("broken", |connection| {
                connection.execute("FAIL perform broken").map(|_| ())
            })
            .with_cleanup(|connection| connection.execute("cleanup broken").map(|_| ())),
            logged_operation("last", Duration::ZERO),
        ],
    )
    .unwrap()
}

// ============================================================================
// SECTION: Session Tests
// ============================================================================

#[test]
fn session_runs_every_operation_in_order_and_emits_each_result() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler =
        Profiler::new(backend.clone(), config_with(&[(WorkerRole::Reader, 1)]), idle_actions())
            .unwrap();
    let sink = InMemoryResultSink::new();
    let report = profiler.profile(&mixed_catalog(), &sink);

    assert_eq!(report.completed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.aborted, 1);
    assert_eq!(report.total(), 4);
    assert!(report.sink_failures.is_empty());

    let results = sink.results().unwrap();
    let names: Vec<&str> = results.iter().map(|result| result.operation.as_str()).collect();
    assert_eq!(names, vec!["first", "unsupported", "broken", "last"]);
    let statuses: Vec<RunStatus> = results.iter().map(|result| result.status).collect();
    assert_eq!(
        statuses,
        vec![RunStatus::Completed, RunStatus::Skipped, RunStatus::Aborted, RunStatus::Completed]
    );

    assert_eq!(
        backend.statements(),
        vec![
            "prepare first",
            "perform first",
            "cleanup first",
            "FAIL perform broken",
            "cleanup broken",
            "prepare last",
            "perform last",
            "cleanup last",
        ]
    );
    let summaries: Vec<&str> = report.runs.iter().map(|run| run.operation.as_str()).collect();
    assert_eq!(summaries, names);
}

#[test]
fn teardown_timeout_does_not_stop_the_session() {
    let backend = Arc::new(ScriptedBackend::new());
    let config =
        config_with(&[(WorkerRole::Update, 1)]).with_teardown_timeout(Duration::from_millis(20));
    let actions = RoleActions::uniform(|_connection, _rng| {
        thread::sleep(Duration::from_millis(200));
        Ok(())
    });
    let profiler = Profiler::new(backend.clone(), config, actions).unwrap();
    let catalog = Catalog::new(
        "stuck",
        vec![logged_operation("one", Duration::ZERO), logged_operation("two", Duration::ZERO)],
    )
    .unwrap();
    let sink = InMemoryResultSink::new();
    let report = profiler.profile(&catalog, &sink);

    assert_eq!(report.aborted, 2);
    let statements = backend.statements();
    assert!(statements.contains(&"cleanup one".to_string()));
    assert!(statements.contains(&"prepare two".to_string()));
    assert!(statements.contains(&"cleanup two".to_string()));
    assert_eq!(sink.results().unwrap().len(), 2);
}

#[test]
fn sink_failures_are_reported_and_the_session_continues() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = Profiler::new(backend.clone(), config_with(&[]), RoleActions::new()).unwrap();
    let sink = RejectingSink {
        attempts: AtomicUsize::new(0),
    };
    let report = profiler.profile(&mixed_catalog(), &sink);

    assert_eq!(sink.attempts.load(Ordering::SeqCst), 4);
    assert_eq!(report.total(), 4);
    // Four record failures plus the final flush.
    assert_eq!(report.sink_failures.len(), 5);
    assert_eq!(report.sink_failures[0].operation.as_deref(), Some("first"));
    assert_eq!(report.sink_failures[4].operation, None);
    assert!(report.sink_failures[0].error.contains("disk full"));
}

#[test]
fn empty_catalog_produces_an_empty_report() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = Profiler::new(backend, config_with(&[]), RoleActions::new()).unwrap();
    let sink = InMemoryResultSink::new();
    let report = profiler.profile(&Catalog::new("empty", Vec::new()).unwrap(), &sink);
    assert_eq!(report.total(), 0);
    assert!(sink.results().unwrap().is_empty());
}
