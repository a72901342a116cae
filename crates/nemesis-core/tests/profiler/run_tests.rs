// nemesis-core/tests/profiler/run_tests.rs
// ============================================================================
// Module: Run Protocol Tests
// Description: Phase ordering and status mapping for single runs.
// Purpose: Validate Profiler::run_operation against each failure mode.
// Dependencies: nemesis-core
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nemesis_core::AbortReason;
use nemesis_core::BackendError;
use nemesis_core::CatalogOperation;
use nemesis_core::Feature;
use nemesis_core::Profiler;
use nemesis_core::ProfilerError;
use nemesis_core::RoleActions;
use nemesis_core::RunStatus;
use nemesis_core::StartBarrier;
use nemesis_core::WorkerRole;

use super::common::ConnectStep;
use super::common::ScriptedBackend;
use super::common::config_with;
use super::common::idle_actions;
use super::common::logged_operation;
use super::common::perform_only;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a profiler over a shared scripted backend.
fn profiler(
    backend: &Arc<ScriptedBackend>,
    counts: &[(WorkerRole, usize)],
    actions: RoleActions,
) -> Profiler {
    Profiler::new(backend.clone(), config_with(counts), actions).unwrap()
}

// ============================================================================
// SECTION: Completed Runs
// ============================================================================

#[test]
fn readers_and_inserters_only_scenario_completes() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(
        &backend,
        &[
            (WorkerRole::Reader, 2),
            (WorkerRole::Insert, 1),
            (WorkerRole::Update, 0),
            (WorkerRole::Delete, 0),
        ],
        idle_actions(),
    );
    let result = profiler.run_operation(&perform_only("noop", Duration::from_millis(20)));

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.abort_reason, None);
    assert_eq!(result.start_barrier, Some(StartBarrier::Confirmed));
    assert_eq!(result.worker_count(WorkerRole::Reader), 2);
    assert_eq!(result.worker_count(WorkerRole::Insert), 1);
    assert_eq!(result.worker_count(WorkerRole::Update), 0);
    assert_eq!(result.worker_count(WorkerRole::Delete), 0);
    assert!(result.outcomes_for(WorkerRole::Reader).count() > 0);
    assert!(result.outcomes_for(WorkerRole::Insert).count() > 0);
    assert_eq!(result.outcomes_for(WorkerRole::Update).count(), 0);
    assert_eq!(result.outcomes_for(WorkerRole::Delete).count(), 0);
    assert_eq!(result.roles.len(), 2);
    // One coordinator connection plus three workers.
    assert_eq!(backend.connects(), 4);
    assert_eq!(backend.open_connections(), 0);
}

#[test]
fn phases_run_in_order_on_the_coordinator_connection() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 1)], idle_actions());
    let result = profiler.run_operation(&logged_operation("add-column", Duration::ZERO));

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(
        backend.statements(),
        vec!["prepare add-column", "perform add-column", "cleanup add-column"]
    );
    let window = result.perform_window.unwrap();
    assert!(window.start <= window.end);
}

#[test]
fn workers_are_active_while_perform_runs() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 2)], idle_actions());
    let result = profiler.run_operation(&perform_only("slow", Duration::from_millis(50)));

    let window = result.perform_window.unwrap();
    let during = result
        .outcomes_for(WorkerRole::Reader)
        .filter(|outcome| window.contains(outcome.offset))
        .count();
    assert!(during > 0);
}

#[test]
fn cleanup_failure_is_reported_without_changing_completed() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Insert, 1)], idle_actions());
    let operation = perform_only("residue", Duration::ZERO)
        .with_cleanup(|connection| connection.execute("FAIL cleanup").map(|_| ()));
    let result = profiler.run_operation(&operation);

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.cleanup_error.as_deref().unwrap().contains("FAIL cleanup"));
}

#[test]
fn repeated_cycles_do_not_fail_on_the_second_prepare() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 1)], idle_actions());
    let created = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let (on_prepare, on_cleanup) = (Arc::clone(&created), Arc::clone(&created));
    let operation = CatalogOperation::new("create-index", |_connection| Ok(()))
        .with_prepare(move |_connection| {
            if on_prepare.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(BackendError::Statement("index already exists".to_string()));
            }
            Ok(())
        })
        .with_cleanup(move |_connection| {
            on_cleanup.store(false, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(profiler.run_operation(&operation).status, RunStatus::Completed);
    assert_eq!(profiler.run_operation(&operation).status, RunStatus::Completed);
}

// ============================================================================
// SECTION: Skipped Runs
// ============================================================================

#[test]
fn unsupported_operation_is_skipped_without_side_effects() {
    let backend = Arc::new(ScriptedBackend::new().with_feature(Feature::RenameIndex));
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 2)], idle_actions());
    let operation =
        logged_operation("online-index", Duration::ZERO).requires(Feature::OnlineIndex);
    let result = profiler.run_operation(&operation);

    assert_eq!(result.status, RunStatus::Skipped);
    assert_eq!(result.total_outcomes(), 0);
    assert!(result.roles.is_empty());
    assert_eq!(result.start_barrier, None);
    assert_eq!(backend.connects(), 0);
    assert!(backend.statements().is_empty());
}

#[test]
fn supported_feature_runs_the_operation() {
    let backend = Arc::new(ScriptedBackend::new().with_feature(Feature::OnlineIndex));
    let profiler = profiler(&backend, &[], idle_actions());
    let operation = perform_only("online-index", Duration::ZERO).requires(Feature::OnlineIndex);
    let result = profiler.run_operation(&operation);

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.start_barrier, Some(StartBarrier::NotRequired));
}

// ============================================================================
// SECTION: Aborted Runs
// ============================================================================

#[test]
fn prepare_failure_aborts_without_perform_or_cleanup() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 2)], idle_actions());
    let operation = CatalogOperation::new("never", |connection| {
        connection.execute("perform never").map(|_| ())
    })
    .with_prepare(|connection| connection.execute("FAIL prepare").map(|_| ()))
    .with_cleanup(|connection| connection.execute("cleanup never").map(|_| ()));
    let result = profiler.run_operation(&operation);

    assert_eq!(result.status, RunStatus::Aborted);
    assert!(matches!(result.abort_reason, Some(AbortReason::Prepare(_))));
    assert_eq!(backend.statements(), vec!["FAIL prepare"]);
    assert_eq!(result.total_outcomes(), 0);
    // Only the coordinator connected; no workers were started.
    assert_eq!(backend.connects(), 1);
}

#[test]
fn perform_failure_aborts_and_still_cleans_up() {
    let backend = Arc::new(ScriptedBackend::new());
    let profiler = profiler(&backend, &[(WorkerRole::Update, 2)], idle_actions());
    let operation = CatalogOperation::new("broken", |connection| {
        thread::sleep(Duration::from_millis(10));
        connection.execute("FAIL perform").map(|_| ())
    })
    .with_cleanup(|connection| connection.execute("cleanup broken").map(|_| ()));
    let result = profiler.run_operation(&operation);

    assert_eq!(result.status, RunStatus::Aborted);
    assert!(matches!(result.abort_reason, Some(AbortReason::Perform(_))));
    assert_eq!(backend.statements(), vec!["FAIL perform", "cleanup broken"]);
    assert!(result.stuck_workers.is_empty());
    assert_eq!(result.worker_count(WorkerRole::Update), 2);
    assert_eq!(backend.open_connections(), 0);
}

#[test]
fn coordinator_connect_failure_aborts_before_prepare() {
    let backend = Arc::new(ScriptedBackend::new().with_script(&[ConnectStep::Fail]));
    let profiler = profiler(&backend, &[(WorkerRole::Reader, 1)], idle_actions());
    let result = profiler.run_operation(&logged_operation("any", Duration::ZERO));

    assert_eq!(result.status, RunStatus::Aborted);
    assert!(matches!(result.abort_reason, Some(AbortReason::Connect(_))));
    assert!(backend.statements().is_empty());
}

#[test]
fn teardown_timeout_aborts_and_still_cleans_up() {
    let backend = Arc::new(ScriptedBackend::new());
    let config = config_with(&[(WorkerRole::Delete, 1)])
        .with_teardown_timeout(Duration::from_millis(20));
    let actions = RoleActions::uniform(|_connection, _rng| {
        thread::sleep(Duration::from_millis(300));
        Ok(())
    });
    let profiler = Profiler::new(backend.clone(), config, actions).unwrap();
    let result = profiler.run_operation(&logged_operation("blocked", Duration::ZERO));

    assert_eq!(result.status, RunStatus::Aborted);
    let Some(AbortReason::Teardown(stuck)) = &result.abort_reason else {
        panic!("expected teardown abort, got {:?}", result.abort_reason);
    };
    assert_eq!(stuck.len(), 1);
    assert_eq!(result.stuck_workers, *stuck);
    assert!(backend.statements().contains(&"cleanup blocked".to_string()));
}

#[test]
fn zero_start_timeout_with_slow_worker_proceeds_degraded() {
    let backend = Arc::new(ScriptedBackend::new().with_script(&[
        ConnectStep::Ok,
        ConnectStep::Delay(Duration::from_millis(150)),
    ]));
    let config = config_with(&[(WorkerRole::Reader, 1)]).with_start_timeout(Duration::ZERO);
    let profiler = Profiler::new(backend.clone(), config, idle_actions()).unwrap();
    let result = profiler.run_operation(&logged_operation("fast", Duration::ZERO));

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.start_barrier.unwrap().is_degraded());
    assert!(backend.statements().contains(&"perform fast".to_string()));
}

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn profiler_rejects_missing_role_actions() {
    let backend = Arc::new(ScriptedBackend::new());
    let err = Profiler::new(
        backend,
        config_with(&[(WorkerRole::Insert, 1)]),
        RoleActions::new(),
    )
    .err()
    .unwrap();
    assert_eq!(err, ProfilerError::MissingAction(WorkerRole::Insert));
}
