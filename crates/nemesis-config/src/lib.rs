// nemesis-config/src/lib.rs
// ============================================================================
// Module: Nemesis Config Library
// Description: Canonical config model and validation for nemesis.toml.
// Purpose: Single source of truth for profiling session settings.
// Dependencies: nemesis-core, nemesis-sinks, nemesis-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `nemesis-config` defines the `nemesis.toml` model. Loading is strict and
//! fails closed: oversized, non-UTF-8, or unknown-field files are rejected,
//! and every value is range-checked before conversion into core types.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
