// nemesis-core/src/runtime/summary.rs
// ============================================================================
// Module: Run Summaries
// Description: Per-role latency percentiles and error rates for a run.
// Purpose: Condense recorded outcomes for reports and console output.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Summaries are derived views; sinks still receive every raw outcome.
//! Percentiles use the nearest-rank method over attempt durations in
//! microseconds. The `window_*` fields only count attempts whose offset falls
//! inside the perform window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::AbortReason;
use crate::core::RunResult;
use crate::core::RunStatus;
use crate::core::StartBarrier;
use crate::core::WorkerRole;
use crate::core::duration_to_us;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Latency and failure figures for one role in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleSummary {
    /// Role summarized.
    pub role: WorkerRole,
    /// Workers that contributed outcomes.
    pub workers: usize,
    /// Recorded attempts.
    pub attempts: usize,
    /// Failed attempts.
    pub failures: usize,
    /// `failures / attempts`, or zero with no attempts.
    pub error_rate: f64,
    /// Median attempt duration.
    pub p50_us: u64,
    /// 95th percentile attempt duration.
    pub p95_us: u64,
    /// 99th percentile attempt duration.
    pub p99_us: u64,
    /// Slowest attempt.
    pub max_us: u64,
    /// Attempts started during the perform window.
    pub window_attempts: usize,
    /// Failed attempts started during the perform window.
    pub window_failures: usize,
    /// Slowest attempt started during the perform window.
    pub window_max_us: u64,
}

/// Condensed view of one [`RunResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Operation name.
    pub operation: String,
    /// Final status.
    pub status: RunStatus,
    /// Abort cause, if any.
    pub abort_reason: Option<AbortReason>,
    /// Start barrier outcome, if load was started.
    pub start_barrier: Option<StartBarrier>,
    /// Wall-clock span of perform, if it ran.
    pub perform_us: Option<u64>,
    /// Cleanup failure, if any.
    pub cleanup_error: Option<String>,
    /// One entry per role that ran workers, in role order.
    pub roles: Vec<RoleSummary>,
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

/// Summarizes a run result per role.
#[must_use]
pub fn summarize(result: &RunResult) -> RunSummary {
    let roles = result
        .roles
        .keys()
        .map(|role| summarize_role(result, *role))
        .collect();
    RunSummary {
        operation: result.operation.clone(),
        status: result.status,
        abort_reason: result.abort_reason.clone(),
        start_barrier: result.start_barrier,
        perform_us: result.perform_window.map(|window| duration_to_us(window.duration())),
        cleanup_error: result.cleanup_error.clone(),
        roles,
    }
}

/// Summarizes the outcomes of one role.
fn summarize_role(result: &RunResult, role: WorkerRole) -> RoleSummary {
    let mut durations = Vec::new();
    let mut failures = 0usize;
    let mut window_attempts = 0usize;
    let mut window_failures = 0usize;
    let mut window_max_us = 0u64;
    for outcome in result.outcomes_for(role) {
        let duration_us = duration_to_us(outcome.duration);
        durations.push(duration_us);
        if !outcome.success {
            failures = failures.saturating_add(1);
        }
        if result.perform_window.is_some_and(|window| window.contains(outcome.offset)) {
            window_attempts = window_attempts.saturating_add(1);
            if !outcome.success {
                window_failures = window_failures.saturating_add(1);
            }
            window_max_us = window_max_us.max(duration_us);
        }
    }
    durations.sort_unstable();
    let attempts = durations.len();
    RoleSummary {
        role,
        workers: result.worker_count(role),
        attempts,
        failures,
        error_rate: ratio(failures, attempts),
        p50_us: percentile_us(&durations, 50),
        p95_us: percentile_us(&durations, 95),
        p99_us: percentile_us(&durations, 99),
        max_us: durations.last().copied().unwrap_or(0),
        window_attempts,
        window_failures,
        window_max_us,
    }
}

/// Nearest-rank percentile of sorted samples; zero for no samples.
#[must_use]
pub fn percentile_us(sorted: &[u64], percentile: u32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let len = u128::try_from(sorted.len()).unwrap_or(u128::MAX);
    let percentile = u128::from(percentile.clamp(1, 100));
    let rank = len.saturating_mul(percentile).saturating_add(99).saturating_div(100).max(1);
    let index = usize::try_from(rank.saturating_sub(1)).unwrap_or(usize::MAX);
    sorted.get(index).or_else(|| sorted.last()).copied().unwrap_or(0)
}

/// Returns `part / whole`, or zero when `whole` is zero.
#[allow(clippy::cast_precision_loss, reason = "Sample counts stay far below 2^52.")]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}
