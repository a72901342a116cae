// nemesis-core/src/lib.rs
// ============================================================================
// Module: Nemesis Core Library
// Description: Public API surface for the Nemesis profiling engine.
// Purpose: Expose core types, contracts, and the run coordinator.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Nemesis measures the availability impact of schema changes on a live
//! database. The core drives synthetic read/write traffic from a pool of
//! workers while a catalogued schema operation is prepared, performed, and
//! cleaned up, and records every worker attempt as a timestamped outcome.
//!
//! The core is backend-agnostic: it talks to databases only through the
//! [`Backend`] and [`Connection`] contracts and hands finished runs to a
//! [`ResultSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Backend;
pub use interfaces::BackendError;
pub use interfaces::Connection;
pub use interfaces::Feature;
pub use interfaces::ResultSink;
pub use interfaces::SinkError;
pub use runtime::InMemoryResultSink;
pub use runtime::PoolError;
pub use runtime::Profiler;
pub use runtime::ProfilerError;
pub use runtime::RoleActions;
pub use runtime::RoleSummary;
pub use runtime::RunSummary;
pub use runtime::SessionReport;
pub use runtime::SinkFailure;
pub use runtime::StopReport;
pub use runtime::TrafficProfile;
pub use runtime::WorkerAction;
pub use runtime::WorkerPool;
pub use runtime::percentile_us;
pub use runtime::random_name;
pub use runtime::summarize;
pub use runtime::worker_action;
