// nemesis-cli/src/main.rs
// ============================================================================
// Module: Nemesis CLI Entry Point
// Description: Command dispatcher for table seeding and profiling sessions.
// Purpose: Run the default schema-change catalog under configured load.
// Dependencies: clap, nemesis-config, nemesis-core, nemesis-sinks,
//               nemesis-sqlite, thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `nemesis` binary seeds the target table, runs profiling sessions, and
//! inspects the catalog and configuration. Results go to the configured
//! results file; stdout carries one summary block per operation and stderr
//! carries `tracing` output filtered by `NEMESIS_LOG` (default `info`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use nemesis_config::BackendConfig;
use nemesis_config::NemesisConfig;
use nemesis_core::Backend;
use nemesis_core::Catalog;
use nemesis_core::Profiler;
use nemesis_core::RoleSummary;
use nemesis_core::RunSummary;
use nemesis_core::SessionReport;
use nemesis_sinks::open_file_sink;
use nemesis_sqlite::SqliteBackend;
use nemesis_sqlite::default_catalog;
use nemesis_sqlite::prepare_structure;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter.
const LOG_ENV: &str = "NEMESIS_LOG";
/// Log filter used when `NEMESIS_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "nemesis", version, about = "Schema change availability profiler")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create and seed the target table.
    Prepare(PrepareCommand),
    /// Run the profiling session.
    Run(RunCommand),
    /// Catalog inspection.
    Catalog {
        /// Selected catalog subcommand.
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArg {
    /// Path to `nemesis.toml` (overrides `NEMESIS_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `prepare`.
#[derive(Args, Debug)]
struct PrepareCommand {
    /// Config source.
    #[command(flatten)]
    config: ConfigArg,
    /// Rows to seed (overrides `traffic.seed_rows`).
    #[arg(long, value_name = "N")]
    rows: Option<u64>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Config source.
    #[command(flatten)]
    config: ConfigArg,
    /// Operation to run; repeatable (overrides `catalog.operations`).
    #[arg(long = "operation", value_name = "NAME")]
    operations: Vec<String>,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// List operations, their required features, and backend support.
    List(ConfigArg),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate(ConfigArg),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Prepare(command) => command_prepare(&command),
        Commands::Run(command) => command_run(&command),
        Commands::Catalog {
            command: CatalogCommand::List(command),
        } => command_catalog_list(&command),
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(&command),
    }
}

/// Installs the stderr `fmt` subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `prepare`.
fn command_prepare(command: &PrepareCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let backend = open_backend(&config)?;
    let rows = command.rows.unwrap_or(config.traffic.seed_rows);
    let seeded = prepare_structure(&backend, &config.traffic.table, rows)
        .map_err(|err| CliError::new(format!("prepare failed: {err}")))?;
    write_stdout(&format!("prepared table {} with {seeded} rows", config.traffic.table))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `run`.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let backend: Arc<dyn Backend> = Arc::new(open_backend(&config)?);
    let catalog = load_catalog(&config)?;
    let selection = if command.operations.is_empty() {
        &config.catalog.operations
    } else {
        &command.operations
    };
    let catalog = catalog.select(selection).map_err(|err| CliError::new(err.to_string()))?;
    let profiler =
        Profiler::new(backend, config.profiler_config(), config.traffic_profile().actions())
            .map_err(|err| CliError::new(err.to_string()))?;
    let sink = open_file_sink(config.output.format, &config.output.path)
        .map_err(|err| CliError::new(format!("cannot open results file: {err}")))?;
    info!(
        operations = catalog.len(),
        workers = profiler.config().total_workers(),
        output = %config.output.path.display(),
        "profiling session starting"
    );

    let report = profiler.profile(&catalog, sink.as_ref());

    let mut output = String::new();
    for run in &report.runs {
        output.push_str(&render_run(run));
    }
    output.push_str(&render_totals(&report));
    write_stdout(output.trim_end())?;
    for failure in &report.sink_failures {
        let operation = failure.operation.as_deref().unwrap_or("final flush");
        write_stderr(&format!("result sink failed for {operation}: {}", failure.error))?;
    }
    if report.sink_failures.is_empty() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Executes `catalog list`.
fn command_catalog_list(command: &ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(command)?;
    let backend = open_backend(&config)?;
    let catalog = load_catalog(&config)?;
    let mut output = format!("catalog {} ({} operations)\n", catalog.name(), catalog.len());
    for operation in catalog.operations() {
        let features: Vec<String> =
            operation.required_features().map(|feature| feature.to_string()).collect();
        let features = if features.is_empty() { "-".to_string() } else { features.join(", ") };
        let support =
            if operation.is_supported_by(&backend) { "supported" } else { "unsupported" };
        output.push_str(&format!("  {:<48} {:<12} {features}\n", operation.name(), support));
    }
    write_stdout(output.trim_end())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(command)?;
    write_stdout(&format!(
        "config ok: {} workers, backend {}, output {} ({})",
        config.profiler_config().total_workers(),
        config.backend.label(),
        config.output.path.display(),
        config.output.format
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Setup Helpers
// ============================================================================

/// Loads the configuration named by `arg`.
fn load_config(arg: &ConfigArg) -> CliResult<NemesisConfig> {
    NemesisConfig::load(arg.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Opens the configured backend.
fn open_backend(config: &NemesisConfig) -> CliResult<SqliteBackend> {
    match &config.backend {
        BackendConfig::Sqlite(sqlite) => SqliteBackend::new(sqlite.clone())
            .map_err(|err| CliError::new(format!("failed to open backend: {err}"))),
    }
}

/// Builds the default catalog for the configured table.
fn load_catalog(config: &NemesisConfig) -> CliResult<Catalog> {
    default_catalog(&config.traffic.table).map_err(|err| CliError::new(err.to_string()))
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders one operation summary block.
fn render_run(run: &RunSummary) -> String {
    let mut block = format!("{}: {}", run.operation, run.status);
    if let Some(reason) = &run.abort_reason {
        block.push_str(&format!(" ({reason})"));
    }
    block.push('\n');
    if let Some(barrier) = run.start_barrier {
        block.push_str(&format!("  start barrier: {barrier}\n"));
    }
    if let Some(perform_us) = run.perform_us {
        block.push_str(&format!("  perform: {perform_us} us\n"));
    }
    if let Some(error) = &run.cleanup_error {
        block.push_str(&format!("  cleanup failed: {error}\n"));
    }
    if !run.roles.is_empty() {
        block.push_str(&format!(
            "  {:<8} {:>7} {:>9} {:>8} {:>8} {:>9} {:>9} {:>9} {:>10} {:>14}\n",
            "role", "workers", "attempts", "failed", "err%", "p50_us", "p95_us", "p99_us", "max_us",
            "window_max_us"
        ));
        for role in &run.roles {
            block.push_str(&render_role(role));
        }
    }
    block
}

/// Renders one role row.
fn render_role(role: &RoleSummary) -> String {
    format!(
        "  {:<8} {:>7} {:>9} {:>8} {:>8.2} {:>9} {:>9} {:>9} {:>10} {:>14}\n",
        role.role.label(),
        role.workers,
        role.attempts,
        role.failures,
        role.error_rate * 100.0,
        role.p50_us,
        role.p95_us,
        role.p99_us,
        role.max_us,
        role.window_max_us
    )
}

/// Renders the session totals line.
fn render_totals(report: &SessionReport) -> String {
    format!(
        "{} operations: {} completed, {} skipped, {} aborted\n",
        report.total(),
        report.completed,
        report.skipped,
        report.aborted
    )
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stderr: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr(message);
    ExitCode::FAILURE
}
