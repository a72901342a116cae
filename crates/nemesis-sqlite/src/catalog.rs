// nemesis-sqlite/src/catalog.rs
// ============================================================================
// Module: Default Catalog
// Description: Standard schema changes measured against the target table.
// Purpose: Supply the naive-strategy operation catalog.
// Dependencies: nemesis-core
// ============================================================================

//! ## Overview
//! Each operation is expressed as plain SQL against the target table.
//! Operations needing features `SQLite` lacks (constraint changes, in-place
//! type changes, invisible or online indexes, index renames) carry those
//! feature requirements and are skipped on `SQLite`.
//!
//! Every cleanup reverts both prepare and perform, and tolerates a perform
//! that never ran, so the catalog can be run repeatedly against one table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nemesis_core::BackendError;
use nemesis_core::Catalog;
use nemesis_core::CatalogOperation;
use nemesis_core::Connection;
use nemesis_core::Feature;

use crate::backend::SqliteBackendError;
use crate::structure::validate_identifier;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the catalog returned by [`default_catalog`].
pub const DEFAULT_CATALOG_NAME: &str = "default";

// ============================================================================
// SECTION: Phase Helpers
// ============================================================================

/// Phase that runs a fixed statement batch.
fn batch(sql: String) -> impl Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync {
    move |connection| connection.execute_batch(&sql)
}

/// Runs `sql` in one transaction, rolling back on failure.
fn atomic(connection: &mut dyn Connection, sql: &str) -> Result<(), BackendError> {
    let result = connection.execute_batch(&format!("BEGIN IMMEDIATE; {sql} COMMIT;"));
    if result.is_err() {
        // Ignored: the transaction may not have started.
        let _rollback = connection.execute_batch("ROLLBACK;");
    }
    result
}

/// Phase that runs a fixed statement batch in one transaction.
fn atomic_batch(
    sql: String,
) -> impl Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync {
    move |connection| atomic(connection, &sql)
}

/// Returns true when `table` has a column named `column`, generated columns
/// included (`table_info` omits them).
fn column_exists(
    connection: &mut dyn Connection,
    table: &str,
    column: &str,
) -> Result<bool, BackendError> {
    let rows = connection.execute(&format!(
        "SELECT 1 FROM pragma_table_xinfo('{table}') WHERE name = '{column}'"
    ))?;
    Ok(rows > 0)
}

/// Returns true when a table named `table` exists.
fn table_exists(connection: &mut dyn Connection, table: &str) -> Result<bool, BackendError> {
    let rows = connection.execute(&format!(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '{table}'"
    ))?;
    Ok(rows > 0)
}

/// Drops each listed column that exists.
fn drop_columns(
    connection: &mut dyn Connection,
    table: &str,
    columns: &[&str],
) -> Result<(), BackendError> {
    for column in columns {
        if column_exists(connection, table, column)? {
            connection.execute_batch(&format!("ALTER TABLE {table} DROP COLUMN {column};"))?;
        }
    }
    Ok(())
}

/// Cleanup dropping the listed indexes and then the listed columns.
fn revert(
    table: &str,
    indexes: &[&str],
    columns: &[&'static str],
) -> impl Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync + use<> {
    let table = table.to_string();
    let drop_indexes: String =
        indexes.iter().map(|index| format!("DROP INDEX IF EXISTS {index};")).collect();
    let columns = columns.to_vec();
    move |connection| {
        if !drop_indexes.is_empty() {
            connection.execute_batch(&drop_indexes)?;
        }
        drop_columns(connection, &table, &columns)
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Builds the default catalog against `table`.
///
/// # Errors
///
/// Returns [`SqliteBackendError::Invalid`] when `table` is not a plain
/// identifier.
pub fn default_catalog(table: &str) -> Result<Catalog, SqliteBackendError> {
    validate_identifier(table)?;
    let operations = vec![
        create_index_on_column(table),
        create_unique_constraint_on_column(table),
        create_index_on_nullable_column(table),
        create_invisible_index_on_column(table),
        create_online_index_on_column(table),
        rename_index(table),
        drop_index_on_column(table),
        drop_foreign_key_constraint(table),
        add_nullable_column(table),
        add_non_nullable_column(table),
        add_virtual_column(table),
        drop_nullable_column(table),
        drop_non_nullable_column(table),
        rename_nullable_column(table),
        rename_non_nullable_column(table),
        modify_data_type_on_nullable_column(table),
        modify_data_type_on_non_nullable_column(table),
        modify_data_type_from_int_to_text(table),
        set_default_expression_on_nullable_column(table),
        set_default_expression_on_non_nullable_column(table),
        make_column_nullable(table),
        make_column_non_nullable(table),
        add_non_nullable_foreign_key(table),
        add_nullable_foreign_key(table),
        rename_table(table),
    ];
    Catalog::new(DEFAULT_CATALOG_NAME, operations)
        .map_err(|err| SqliteBackendError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Index Operations
// ============================================================================

/// Plain index on `name`.
fn create_index_on_column(table: &str) -> CatalogOperation {
    let index = format!("{table}_name_idx");
    CatalogOperation::new(
        "create-index-on-column",
        batch(format!("CREATE INDEX {index} ON {table} (name);")),
    )
    .with_cleanup(revert(table, &[index.as_str()], &[]))
}

/// Unique constraint over `(name, id)`.
fn create_unique_constraint_on_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "create-unique-constraint-on-column",
        batch(format!(
            "ALTER TABLE {table} ADD CONSTRAINT {table}_name_id_unique UNIQUE (name, id);"
        )),
    )
    .with_cleanup(batch(format!("ALTER TABLE {table} DROP CONSTRAINT {table}_name_id_unique;")))
    .requires(Feature::ColumnConstraints)
}

/// Index on a freshly added nullable column.
fn create_index_on_nullable_column(table: &str) -> CatalogOperation {
    let index = format!("{table}_jobtitle_idx");
    CatalogOperation::new(
        "create-index-on-nullable-column",
        batch(format!("CREATE INDEX {index} ON {table} (jobtitle);")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN jobtitle TEXT;")))
    .with_cleanup(revert(table, &[index.as_str()], &["jobtitle"]))
}

/// Index hidden from the planner at creation.
fn create_invisible_index_on_column(table: &str) -> CatalogOperation {
    let index = format!("{table}_name_idx");
    CatalogOperation::new(
        "create-index-invisible-on-column",
        batch(format!("CREATE INDEX {index} ON {table} (name) INVISIBLE;")),
    )
    .with_cleanup(revert(table, &[index.as_str()], &[]))
    .requires(Feature::InvisibleIndex)
}

/// Index built without blocking writers.
fn create_online_index_on_column(table: &str) -> CatalogOperation {
    let index = format!("{table}_name_idx");
    CatalogOperation::new(
        "create-index-online-on-column",
        batch(format!("CREATE INDEX CONCURRENTLY {index} ON {table} (name);")),
    )
    .with_cleanup(revert(table, &[index.as_str()], &[]))
    .requires(Feature::OnlineIndex)
}

/// In-place index rename.
fn rename_index(table: &str) -> CatalogOperation {
    let index = format!("{table}_name_idx");
    let renamed = format!("{table}_name2_idx");
    CatalogOperation::new(
        "rename-index",
        batch(format!("ALTER INDEX {index} RENAME TO {renamed};")),
    )
    .with_prepare(batch(format!("CREATE INDEX {index} ON {table} (name);")))
    .with_cleanup(revert(table, &[index.as_str(), renamed.as_str()], &[]))
    .requires(Feature::RenameIndex)
}

/// Drop of an existing index.
fn drop_index_on_column(table: &str) -> CatalogOperation {
    let index = format!("{table}_name_idx");
    CatalogOperation::new("drop-index-on-column", batch(format!("DROP INDEX {index};")))
        .with_prepare(batch(format!("CREATE INDEX {index} ON {table} (name);")))
        .with_cleanup(revert(table, &[index.as_str()], &[]))
}

// ============================================================================
// SECTION: Foreign Key Operations
// ============================================================================

/// Statements creating the referenced `addresses` table with one row.
fn create_addresses(table: &str) -> String {
    format!(
        "CREATE TABLE {table}_addresses (id INTEGER PRIMARY KEY, address TEXT NOT NULL DEFAULT \
         ''); INSERT INTO {table}_addresses (id, address) VALUES (1, '');"
    )
}

/// Cleanup removing `address_id` and the `addresses` table.
fn drop_address_reference(
    table: &str,
) -> impl Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync + use<> {
    let table = table.to_string();
    move |connection| {
        drop_columns(connection, &table, &["address_id"])?;
        connection.execute_batch(&format!("DROP TABLE IF EXISTS {table}_addresses;"))
    }
}

/// Drop of an existing foreign key constraint.
fn drop_foreign_key_constraint(table: &str) -> CatalogOperation {
    let prepare = format!(
        "{} ALTER TABLE {table} ADD COLUMN address_id INTEGER NOT NULL DEFAULT 1; ALTER TABLE \
         {table} ADD CONSTRAINT {table}_address_fk FOREIGN KEY (address_id) REFERENCES \
         {table}_addresses (id);",
        create_addresses(table)
    );
    CatalogOperation::new(
        "drop-foreign-key-constraint",
        batch(format!("ALTER TABLE {table} DROP CONSTRAINT {table}_address_fk;")),
    )
    .with_prepare(atomic_batch(prepare))
    .with_cleanup(drop_address_reference(table))
    .requires(Feature::ColumnConstraints)
}

/// Added non-nullable column referencing `addresses`.
fn add_non_nullable_foreign_key(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "add-non-nullable-foreign-key",
        batch(format!(
            "ALTER TABLE {table} ADD COLUMN address_id INTEGER NOT NULL DEFAULT 1 REFERENCES \
             {table}_addresses (id);"
        )),
    )
    .with_prepare(atomic_batch(create_addresses(table)))
    .with_cleanup(drop_address_reference(table))
    .requires(Feature::ColumnConstraints)
    .requires(Feature::DefaultValueForText)
}

/// Added nullable column referencing `addresses`.
fn add_nullable_foreign_key(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "add-nullable-foreign-key",
        batch(format!(
            "ALTER TABLE {table} ADD COLUMN address_id INTEGER REFERENCES {table}_addresses (id);"
        )),
    )
    .with_prepare(atomic_batch(create_addresses(table)))
    .with_cleanup(drop_address_reference(table))
    .requires(Feature::ColumnConstraints)
}

// ============================================================================
// SECTION: Column Operations
// ============================================================================

/// Nullable column add.
fn add_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "add-nullable-column",
        batch(format!("ALTER TABLE {table} ADD COLUMN email TEXT;")),
    )
    .with_cleanup(revert(table, &[], &["email"]))
}

/// Non-nullable column add with a text default.
fn add_non_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "add-non-nullable-column",
        batch(format!(
            "ALTER TABLE {table} ADD COLUMN life_story TEXT NOT NULL DEFAULT 'Simple story';"
        )),
    )
    .with_cleanup(revert(table, &[], &["life_story"]))
    .requires(Feature::DefaultValueForText)
}

/// Computed column over `name`.
fn add_virtual_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "add-virtual-column",
        batch(format!(
            "ALTER TABLE {table} ADD COLUMN initials TEXT GENERATED ALWAYS AS (substr(name, 1, \
             2)) VIRTUAL;"
        )),
    )
    .with_cleanup(revert(table, &[], &["initials"]))
    .requires(Feature::VirtualColumn)
}

/// Drop of a nullable column.
fn drop_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "drop-nullable-column",
        batch(format!("ALTER TABLE {table} DROP COLUMN email;")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN email TEXT;")))
    .with_cleanup(revert(table, &[], &["email"]))
}

/// Drop of a non-nullable column.
fn drop_non_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "drop-non-nullable-column",
        batch(format!("ALTER TABLE {table} DROP COLUMN email;")),
    )
    .with_prepare(batch(format!(
        "ALTER TABLE {table} ADD COLUMN email TEXT NOT NULL DEFAULT 'NOT_SET';"
    )))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::DefaultValueForText)
}

/// Rename of a nullable column.
fn rename_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "rename-nullable-column",
        batch(format!("ALTER TABLE {table} RENAME COLUMN email TO email2;")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN email TEXT;")))
    .with_cleanup(revert(table, &[], &["email", "email2"]))
}

/// Rename of a non-nullable column.
fn rename_non_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "rename-non-nullable-column",
        batch(format!("ALTER TABLE {table} RENAME COLUMN email TO email2;")),
    )
    .with_prepare(batch(format!(
        "ALTER TABLE {table} ADD COLUMN email TEXT NOT NULL DEFAULT 'NOT_SET';"
    )))
    .with_cleanup(revert(table, &[], &["email", "email2"]))
    .requires(Feature::DefaultValueForText)
}

/// In-place type change of a nullable column.
fn modify_data_type_on_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "modify-data-type-on-nullable-column",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email TYPE TEXT;")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN email VARCHAR(255);")))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ModifyDatatype)
}

/// In-place type change of a non-nullable column.
fn modify_data_type_on_non_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "modify-data-type-on-non-nullable-column",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email TYPE TEXT;")),
    )
    .with_prepare(batch(format!(
        "ALTER TABLE {table} ADD COLUMN email VARCHAR(255) NOT NULL DEFAULT 'NOT_SET';"
    )))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ModifyDatatype)
    .requires(Feature::DefaultValueForText)
}

/// Integer to text conversion of a populated column.
fn modify_data_type_from_int_to_text(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "modify-data-type-from-int-to-text",
        batch(format!("ALTER TABLE {table} ALTER COLUMN cnt TYPE TEXT;")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN cnt BIGINT NOT NULL DEFAULT 8;")))
    .with_cleanup(revert(table, &[], &["cnt"]))
    .requires(Feature::ModifyDatatype)
    .requires(Feature::DefaultValueForText)
}

/// New default on a nullable column.
fn set_default_expression_on_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "set-default-expression-on-nullable-column",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email SET DEFAULT 'SOMETHING ELSE';")),
    )
    .with_prepare(batch(format!("ALTER TABLE {table} ADD COLUMN email TEXT;")))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ColumnConstraints)
    .requires(Feature::DefaultValueForText)
}

/// New default on a non-nullable column.
fn set_default_expression_on_non_nullable_column(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "set-default-expression-on-non-nullable-column",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email SET DEFAULT 'SOMETHING ELSE';")),
    )
    .with_prepare(batch(format!(
        "ALTER TABLE {table} ADD COLUMN email TEXT NOT NULL DEFAULT 'NOT_SET';"
    )))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ColumnConstraints)
    .requires(Feature::DefaultValueForText)
}

/// Relaxing a NOT NULL column.
fn make_column_nullable(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "make-column-nullable",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email DROP NOT NULL;")),
    )
    .with_prepare(batch(format!(
        "ALTER TABLE {table} ADD COLUMN email TEXT NOT NULL DEFAULT 'NOT_SET';"
    )))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ColumnConstraints)
    .requires(Feature::DefaultValueForText)
}

/// Tightening a nullable column to NOT NULL.
fn make_column_non_nullable(table: &str) -> CatalogOperation {
    CatalogOperation::new(
        "make-column-non-nullable",
        batch(format!("ALTER TABLE {table} ALTER COLUMN email SET NOT NULL;")),
    )
    .with_prepare(atomic_batch(format!(
        "ALTER TABLE {table} ADD COLUMN email TEXT DEFAULT 'NOT_SET'; UPDATE {table} SET email = \
         'NOT_SET' WHERE email IS NULL;"
    )))
    .with_cleanup(revert(table, &[], &["email"]))
    .requires(Feature::ColumnConstraints)
    .requires(Feature::DefaultValueForText)
}

// ============================================================================
// SECTION: Table Operations
// ============================================================================

/// Atomic swap of the target table with an empty replacement.
fn rename_table(table: &str) -> CatalogOperation {
    let next = format!("{table}_v2");
    let previous = format!("{table}_v1");
    let perform_sql =
        format!("ALTER TABLE {table} RENAME TO {previous}; ALTER TABLE {next} RENAME TO {table};");
    let revert_sql =
        format!("ALTER TABLE {table} RENAME TO {next}; ALTER TABLE {previous} RENAME TO {table};");
    CatalogOperation::new("rename-table", move |connection| atomic(connection, &perform_sql))
        .with_prepare(batch(format!(
            "CREATE TABLE {next} (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);"
        )))
        .with_cleanup(move |connection| {
            if table_exists(connection, &previous)? {
                atomic(connection, &revert_sql)?;
            }
            if table_exists(connection, &next)? {
                connection.execute_batch(&format!("DROP TABLE {next};"))?;
            }
            Ok(())
        })
        .requires(Feature::RenameTableInOneTx)
}
