// nemesis-sinks/src/file.rs
// ============================================================================
// Module: File Sinks
// Description: Output format selection and file-backed sink construction.
// Purpose: Open the configured results file with the matching writer.
// Dependencies: nemesis-core, serde, tracing
// ============================================================================

//! ## Overview
//! [`open_file_sink`] creates the results file named in the configuration,
//! truncating any previous content, and wraps it in the sink matching
//! [`SinkFormat`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nemesis_core::ResultSink;
use nemesis_core::SinkError;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::csv::CsvSink;
use crate::jsonl::JsonLinesSink;

// ============================================================================
// SECTION: Format
// ============================================================================

/// On-disk result format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFormat {
    /// Newline-delimited JSON.
    #[default]
    Jsonl,
    /// Comma-separated values.
    Csv,
}

impl SinkFormat {
    /// Returns the stable lowercase label for the format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Creates (or truncates) `path` and returns a buffered sink for `format`.
///
/// # Errors
///
/// Returns [`SinkError::Write`] when the file or its parent directory cannot
/// be created.
pub fn open_file_sink(format: SinkFormat, path: &Path) -> Result<Box<dyn ResultSink>, SinkError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| SinkError::Write(err.to_string()))?;
    }
    let file = File::create(path).map_err(|err| SinkError::Write(err.to_string()))?;
    let writer = BufWriter::new(file);
    info!(path = %path.display(), format = %format, "results file opened");
    Ok(match format {
        SinkFormat::Jsonl => Box::new(JsonLinesSink::new(writer)),
        SinkFormat::Csv => Box::new(CsvSink::new(writer)),
    })
}
