// nemesis-core/src/runtime/mod.rs
// ============================================================================
// Module: Nemesis Runtime
// Description: Worker threads, the worker pool, and the run coordinator.
// Purpose: Drive synthetic load around catalogued schema operations.
// Dependencies: crate::{core, interfaces}, rand, tracing
// ============================================================================

//! ## Overview
//! The runtime turns a [`crate::ProfilerConfig`] and a [`crate::Catalog`] into
//! recorded [`crate::RunResult`] values. [`Profiler`] is the run coordinator;
//! [`WorkerPool`] owns the worker threads of a single run.

// ============================================================================
// SECTION: Submodules
// ============================================================================

mod names;
pub mod pool;
pub mod profiler;
pub mod sink;
pub mod summary;
pub mod traffic;
mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use names::random_name;
pub use pool::PoolError;
pub use pool::StopReport;
pub use pool::WorkerPool;
pub use profiler::Profiler;
pub use profiler::ProfilerError;
pub use profiler::SessionReport;
pub use profiler::SinkFailure;
pub use sink::InMemoryResultSink;
pub use summary::RoleSummary;
pub use summary::RunSummary;
pub use summary::percentile_us;
pub use summary::summarize;
pub use traffic::RoleActions;
pub use traffic::TrafficProfile;
pub use traffic::WorkerAction;
pub use traffic::worker_action;
