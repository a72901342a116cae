// nemesis-sqlite/src/lib.rs
// ============================================================================
// Module: Nemesis SQLite Backend
// Description: SQLite adapter for the Nemesis profiling engine.
// Purpose: Open per-worker connections, seed the target table, and supply
//          the default schema operation catalog.
// Dependencies: nemesis-core, rusqlite
// ============================================================================

//! ## Overview
//! [`SqliteBackend`] implements the core [`nemesis_core::Backend`] contract
//! on top of `rusqlite`. Every call to `connect` opens a fresh connection so
//! workers and the coordinator never share one. [`prepare_structure`]
//! recreates and seeds the target table, and [`default_catalog`] lists the
//! standard schema changes; operations `SQLite` cannot express are gated by
//! feature flags and skipped at run time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod catalog;
pub mod structure;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::SUPPORTED_FEATURES;
pub use backend::SqliteBackend;
pub use backend::SqliteBackendConfig;
pub use backend::SqliteBackendError;
pub use backend::SqliteConnection;
pub use backend::SqliteJournalMode;
pub use backend::SqliteSyncMode;
pub use catalog::DEFAULT_CATALOG_NAME;
pub use catalog::default_catalog;
pub use structure::prepare_structure;
pub use structure::validate_identifier;
