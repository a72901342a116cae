// nemesis-config/src/config.rs
// ============================================================================
// Module: Nemesis Configuration
// Description: Configuration loading and validation for profiling sessions.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: nemesis-core, nemesis-sinks, nemesis-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `NEMESIS_CONFIG`, then
//! `./nemesis.toml`. Every section is optional and falls back to defaults;
//! unknown fields are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use nemesis_core::DEFAULT_START_TIMEOUT;
use nemesis_core::DEFAULT_TEARDOWN_TIMEOUT;
use nemesis_core::ProfilerConfig;
use nemesis_core::TrafficProfile;
use nemesis_core::WorkerRole;
use nemesis_sinks::SinkFormat;
use nemesis_sqlite::SqliteBackendConfig;
use nemesis_sqlite::default_catalog;
use nemesis_sqlite::validate_identifier;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "nemesis.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "NEMESIS_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum workers per role.
pub const MAX_WORKERS_PER_ROLE: usize = 256;
/// Maximum start, teardown, or busy timeout in milliseconds (one hour).
pub const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;
/// Default target table.
const DEFAULT_TABLE: &str = "users";
/// Default key space for keyed traffic.
const DEFAULT_KEY_SPACE: u64 = 10_000;
/// Default rows seeded by `prepare`.
const DEFAULT_SEED_ROWS: u64 = 10_000;
/// Default `SQLite` database file.
const DEFAULT_DATABASE_PATH: &str = "nemesis.sqlite";
/// Default results file.
const DEFAULT_OUTPUT_PATH: &str = "nemesis-results.jsonl";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Root of `nemesis.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NemesisConfig {
    /// Worker counts per role.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Start and teardown bounds.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Target table and key space for the standard traffic.
    #[serde(default)]
    pub traffic: TrafficConfig,
    /// Database backend.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Results output.
    #[serde(default)]
    pub output: OutputConfig,
    /// Operation selection.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl NemesisConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workers.validate()?;
        self.timeouts.validate()?;
        self.traffic.validate()?;
        self.backend.validate()?;
        self.output.validate()?;
        self.catalog.validate(&self.traffic.table)?;
        Ok(())
    }

    /// Returns the profiler configuration described by `workers` and
    /// `timeouts`.
    #[must_use]
    pub fn profiler_config(&self) -> ProfilerConfig {
        WorkerRole::ALL.into_iter().fold(
            ProfilerConfig::new(self.timeouts.start(), self.timeouts.teardown()),
            |config, role| config.with_workers(role, self.workers.count(role)),
        )
    }

    /// Returns the standard traffic for the configured table.
    #[must_use]
    pub fn traffic_profile(&self) -> TrafficProfile {
        TrafficProfile::new(self.traffic.table.clone(), self.traffic.key_space)
    }
}

/// Worker counts per role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkersConfig {
    /// Reader workers.
    #[serde(default = "default_workers")]
    pub reader: usize,
    /// Insert workers.
    #[serde(default = "default_workers")]
    pub insert: usize,
    /// Update workers.
    #[serde(default = "default_workers")]
    pub update: usize,
    /// Delete workers.
    #[serde(default = "default_workers")]
    pub delete: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            reader: default_workers(),
            insert: default_workers(),
            update: default_workers(),
            delete: default_workers(),
        }
    }
}

impl WorkersConfig {
    /// Returns the configured count for `role`.
    #[must_use]
    pub const fn count(&self, role: WorkerRole) -> usize {
        match role {
            WorkerRole::Reader => self.reader,
            WorkerRole::Insert => self.insert,
            WorkerRole::Update => self.update,
            WorkerRole::Delete => self.delete,
        }
    }

    /// Validates per-role limits and that at least one worker runs.
    fn validate(&self) -> Result<(), ConfigError> {
        for role in WorkerRole::ALL {
            if self.count(role) > MAX_WORKERS_PER_ROLE {
                return Err(ConfigError::Invalid(format!(
                    "workers.{} exceeds max {MAX_WORKERS_PER_ROLE}",
                    role.label()
                )));
            }
        }
        let total: usize = WorkerRole::ALL.into_iter().map(|role| self.count(role)).sum();
        if total == 0 {
            return Err(ConfigError::Invalid(
                "workers must configure at least one worker".to_string(),
            ));
        }
        Ok(())
    }
}

/// Start and teardown bounds in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    /// Start barrier timeout.
    #[serde(default = "default_start_ms")]
    pub start_ms: u64,
    /// Teardown timeout.
    #[serde(default = "default_teardown_ms")]
    pub teardown_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            start_ms: default_start_ms(),
            teardown_ms: default_teardown_ms(),
        }
    }
}

impl TimeoutsConfig {
    /// Returns the start barrier timeout.
    #[must_use]
    pub const fn start(&self) -> Duration {
        Duration::from_millis(self.start_ms)
    }

    /// Returns the teardown timeout.
    #[must_use]
    pub const fn teardown(&self) -> Duration {
        Duration::from_millis(self.teardown_ms)
    }

    /// Validates the upper bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("timeouts.start_ms", self.start_ms)?;
        validate_timeout("timeouts.teardown_ms", self.teardown_ms)
    }
}

/// Target of the standard traffic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficConfig {
    /// Target table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Keys drawn uniformly from `1..=key_space`.
    #[serde(default = "default_key_space")]
    pub key_space: u64,
    /// Rows seeded by `prepare`.
    #[serde(default = "default_seed_rows")]
    pub seed_rows: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            key_space: default_key_space(),
            seed_rows: default_seed_rows(),
        }
    }
}

impl TrafficConfig {
    /// Validates the table identifier and key space.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier(&self.table).map_err(|_| {
            ConfigError::Invalid("traffic.table must be a plain identifier".to_string())
        })?;
        if self.key_space == 0 {
            return Err(ConfigError::Invalid("traffic.key_space must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Database backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// File-backed `SQLite` database.
    Sqlite(SqliteBackendConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteBackendConfig::new(DEFAULT_DATABASE_PATH))
    }
}

impl BackendConfig {
    /// Returns the backend type label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
        }
    }

    /// Validates backend settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Sqlite(sqlite) => {
                validate_path_string("backend.path", &sqlite.path.to_string_lossy())?;
                validate_timeout("backend.busy_timeout_ms", sqlite.busy_timeout_ms)
            }
        }
    }
}

/// Results output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// File format.
    #[serde(default)]
    pub format: SinkFormat,
    /// Results file path.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: SinkFormat::default(),
            path: default_output_path(),
        }
    }
}

impl OutputConfig {
    /// Validates the output path.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("output.path", &self.path.to_string_lossy())
    }
}

/// Operation selection from the default catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Operations to run, in catalog order; empty runs every operation.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl CatalogConfig {
    /// Validates that every named operation exists exactly once.
    fn validate(&self, table: &str) -> Result<(), ConfigError> {
        let catalog =
            default_catalog(table).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        let mut seen = BTreeSet::new();
        for name in &self.operations {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("catalog.operations repeats {name}")));
            }
            if catalog.get(name).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "catalog.operations names unknown operation {name}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a millisecond timeout against [`MAX_TIMEOUT_MS`].
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!("{field} exceeds max {MAX_TIMEOUT_MS}")));
    }
    Ok(())
}

/// Default workers per role.
const fn default_workers() -> usize {
    1
}

/// Default start barrier timeout in milliseconds.
fn default_start_ms() -> u64 {
    u64::try_from(DEFAULT_START_TIMEOUT.as_millis()).unwrap_or(MAX_TIMEOUT_MS)
}

/// Default teardown timeout in milliseconds.
fn default_teardown_ms() -> u64 {
    u64::try_from(DEFAULT_TEARDOWN_TIMEOUT.as_millis()).unwrap_or(MAX_TIMEOUT_MS)
}

/// Default target table.
fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Default key space.
const fn default_key_space() -> u64 {
    DEFAULT_KEY_SPACE
}

/// Default seeded rows.
const fn default_seed_rows() -> u64 {
    DEFAULT_SEED_ROWS
}

/// Default results file.
fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}
