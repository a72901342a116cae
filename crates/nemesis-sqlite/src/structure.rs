// nemesis-sqlite/src/structure.rs
// ============================================================================
// Module: Table Structure
// Description: Creation and seeding of the traffic target table.
// Purpose: Give workers a populated table to read and write.
// Dependencies: nemesis-core, rand, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`prepare_structure`] drops and recreates the target table as
//! `(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)` and inserts
//! the requested number of random names in one transaction. Leftover tables
//! from an interrupted `rename-table` run are dropped as well.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nemesis_core::random_name;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::params;
use tracing::info;

use crate::backend::SqliteBackend;
use crate::backend::SqliteBackendError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum identifier length accepted for table names.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Rows inserted between progress log lines.
const PROGRESS_INTERVAL: u64 = 100_000;

// ============================================================================
// SECTION: Structure
// ============================================================================

/// Checks that `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// # Errors
///
/// Returns [`SqliteBackendError::Invalid`] for anything else.
pub fn validate_identifier(name: &str) -> Result<(), SqliteBackendError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    let valid_rest = chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid_start || !valid_rest || name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SqliteBackendError::Invalid(format!("invalid table identifier: {name}")));
    }
    Ok(())
}

/// Recreates `table` and seeds it with `rows` random names. Returns the number
/// of rows inserted.
///
/// # Errors
///
/// Returns [`SqliteBackendError`] when the table name is invalid or any
/// statement fails; the transaction is rolled back in that case.
pub fn prepare_structure(
    backend: &SqliteBackend,
    table: &str,
    rows: u64,
) -> Result<u64, SqliteBackendError> {
    validate_identifier(table)?;
    let mut connection = backend.open()?;
    let tx = connection.transaction().map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table}; DROP TABLE IF EXISTS {table}_v1; DROP TABLE IF EXISTS \
         {table}_v2; CREATE TABLE {table} (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT \
         NULL);"
    ))
    .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    {
        let mut insert = tx
            .prepare(&format!("INSERT INTO {table} (name) VALUES (?1)"))
            .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
        let mut rng = StdRng::from_entropy();
        for inserted in 1 ..= rows {
            insert
                .execute(params![random_name(&mut rng)])
                .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
            if inserted % PROGRESS_INTERVAL == 0 {
                info!(table, inserted, total = rows, "seeding rows");
            }
        }
    }
    tx.commit().map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    info!(table, rows, "target table prepared");
    Ok(rows)
}
