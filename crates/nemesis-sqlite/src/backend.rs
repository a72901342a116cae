// nemesis-sqlite/src/backend.rs
// ============================================================================
// Module: SQLite Backend
// Description: Backend and Connection implementations over rusqlite.
// Purpose: Give every worker and the coordinator its own SQLite session.
// Dependencies: nemesis-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteBackend`] validates the database path once and then opens a new
//! connection per [`Backend::connect`] call with the configured journal mode,
//! sync mode, and busy timeout. A short busy timeout turns lock contention
//! during schema changes into recorded failures instead of long stalls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use nemesis_core::Backend;
use nemesis_core::BackendError;
use nemesis_core::Connection;
use nemesis_core::Feature;
use rusqlite::OpenFlags;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Features `SQLite` can express.
pub const SUPPORTED_FEATURES: [Feature; 3] =
    [Feature::DefaultValueForText, Feature::RenameTableInOneTx, Feature::VirtualColumn];

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode; readers and the writer do not block each other.
    #[default]
    Wal,
    /// Rollback journal; writers block readers.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    Full,
    /// Normal synchronous mode.
    #[default]
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteBackendConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteBackendConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` backend errors.
#[derive(Debug, Error)]
pub enum SqliteBackendError {
    /// Filesystem error around the database file.
    #[error("sqlite backend io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite backend db error: {0}")]
    Db(String),
    /// Invalid configuration or input.
    #[error("sqlite backend invalid input: {0}")]
    Invalid(String),
}

impl From<SqliteBackendError> for BackendError {
    fn from(error: SqliteBackendError) -> Self {
        match error {
            SqliteBackendError::Io(message) | SqliteBackendError::Db(message) => {
                Self::Connect(message)
            }
            SqliteBackendError::Invalid(message) => Self::Statement(message),
        }
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// `SQLite` backend opening one connection per caller.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    /// Backend configuration.
    config: SqliteBackendConfig,
}

impl SqliteBackend {
    /// Validates the configuration and opens the database once.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteBackendError`] when the path is invalid or the
    /// database cannot be opened.
    pub fn new(config: SqliteBackendConfig) -> Result<Self, SqliteBackendError> {
        validate_database_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let backend = Self {
            config,
        };
        drop(backend.open()?);
        Ok(backend)
    }

    /// Returns the backend configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    /// Opens a raw `rusqlite` connection with the configured pragmas.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteBackendError::Db`] when the database cannot be opened.
    pub fn open(&self) -> Result<rusqlite::Connection, SqliteBackendError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = rusqlite::Connection::open_with_flags(&self.config.path, flags)
            .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
        apply_pragmas(&connection, &self.config)?;
        Ok(connection)
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        let connection = self.open()?;
        debug!(path = %self.config.path.display(), "sqlite connection opened");
        Ok(Box::new(SqliteConnection {
            connection,
        }))
    }

    fn supports(&self, feature: Feature) -> bool {
        SUPPORTED_FEATURES.contains(&feature)
    }
}

// ============================================================================
// SECTION: Connection
// ============================================================================

/// Exclusive `SQLite` session.
pub struct SqliteConnection {
    /// Underlying `rusqlite` connection.
    connection: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn execute(&mut self, statement: &str) -> Result<u64, BackendError> {
        let mut prepared = self
            .connection
            .prepare(statement)
            .map_err(|err| BackendError::Statement(err.to_string()))?;
        if prepared.column_count() == 0 {
            let affected =
                prepared.execute([]).map_err(|err| BackendError::Statement(err.to_string()))?;
            return Ok(u64::try_from(affected).unwrap_or(u64::MAX));
        }
        let mut rows = prepared.query([]).map_err(|err| BackendError::Statement(err.to_string()))?;
        let mut count = 0u64;
        while rows.next().map_err(|err| BackendError::Statement(err.to_string()))?.is_some() {
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    fn execute_batch(&mut self, statements: &str) -> Result<(), BackendError> {
        self.connection
            .execute_batch(statements)
            .map_err(|err| BackendError::Statement(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteBackendError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteBackendError::Io("database path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteBackendError::Io(err.to_string()))
}

/// Validates database paths for safety limits.
fn validate_database_path(path: &Path) -> Result<(), SqliteBackendError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteBackendError::Invalid("database path must not be empty".to_string()));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteBackendError::Invalid("database path exceeds length limit".to_string()));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(SqliteBackendError::Invalid(
            "database path contains an overlong component".to_string(),
        ));
    }
    if path.is_dir() {
        return Err(SqliteBackendError::Invalid(
            "database path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Applies the configured pragmas and busy timeout.
fn apply_pragmas(
    connection: &rusqlite::Connection,
    config: &SqliteBackendConfig,
) -> Result<(), SqliteBackendError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    Ok(())
}
