// nemesis-core/src/core/mod.rs
// ============================================================================
// Module: Nemesis Core Types
// Description: Data model shared by the worker pool, coordinator, and sinks.
// Purpose: Define roles, profiler configuration, outcomes, and the catalog.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what a profiling session is made of: worker roles and
//! counts, the operation catalog, and the outcomes recorded per run. They carry
//! no behavior beyond construction and simple queries.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod config;
pub mod outcome;
pub mod role;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::Catalog;
pub use catalog::CatalogError;
pub use catalog::CatalogOperation;
pub use catalog::PhaseFn;
pub use config::DEFAULT_START_TIMEOUT;
pub use config::DEFAULT_TEARDOWN_TIMEOUT;
pub use config::ProfilerConfig;
pub use outcome::AbortReason;
pub use outcome::Outcome;
pub use outcome::OutcomeRecord;
pub use outcome::PerformWindow;
pub use outcome::RunResult;
pub use outcome::RunStatus;
pub use outcome::StartBarrier;
pub use outcome::WorkerOutcomes;
pub use outcome::duration_to_us;
pub use role::WorkerId;
pub use role::WorkerRole;
