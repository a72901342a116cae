// nemesis-sinks/src/csv.rs
// ============================================================================
// Module: Delimited Sink
// Description: CSV writer for outcome records.
// Purpose: Persist raw outcomes in a spreadsheet-friendly format.
// Dependencies: csv, nemesis-core
// ============================================================================

//! ## Overview
//! The header is written once, before the first row. Every outcome becomes
//! one row; runs without outcomes (skipped or aborted early) add no rows.
//! Quoting follows the `csv` crate's default: only fields containing the
//! delimiter, a quote, or a line break are quoted, with embedded quotes
//! doubled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use csv::Writer;
use csv::WriterBuilder;
use nemesis_core::OutcomeRecord;
use nemesis_core::ResultSink;
use nemesis_core::RunResult;
use nemesis_core::SinkError;

use crate::poisoned;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Column names, in row order.
pub const CSV_HEADER: [&str; 8] =
    ["operation", "status", "role", "worker", "offset_us", "duration_us", "success", "error"];

/// Default field delimiter.
const DEFAULT_DELIMITER: u8 = b',';

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Writer plus header bookkeeping.
struct CsvState<W: Write> {
    /// Record writer over the destination.
    writer: Writer<W>,
    /// Whether the header record has been written.
    header_written: bool,
}

/// Result sink writing delimited rows.
pub struct CsvSink<W: Write + Send> {
    /// Guarded writer state.
    state: Mutex<CsvState<W>>,
}

impl<W: Write + Send> CsvSink<W> {
    /// Creates a comma-delimited sink writing into `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self::with_delimiter(writer, DEFAULT_DELIMITER)
    }

    /// Creates a sink using `delimiter` between fields.
    #[must_use]
    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        let writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
        Self {
            state: Mutex::new(CsvState {
                writer,
                header_written: false,
            }),
        }
    }
}

/// Renders one outcome as its field values.
fn row(record: &OutcomeRecord) -> [String; 8] {
    [
        record.operation.clone(),
        record.status.label().to_string(),
        record.role.label().to_string(),
        record.worker.to_string(),
        record.offset_us.to_string(),
        record.duration_us.to_string(),
        record.success.to_string(),
        record.error.clone().unwrap_or_default(),
    ]
}

/// Maps a csv writer error into a sink write error.
fn write_error(err: impl ToString) -> SinkError {
    SinkError::Write(err.to_string())
}

impl<W: Write + Send> ResultSink for CsvSink<W> {
    fn record(&self, result: &RunResult) -> Result<(), SinkError> {
        let records = result.records();
        let mut state = self.state.lock().map_err(|_| poisoned("csv"))?;
        if !state.header_written {
            state.writer.write_record(CSV_HEADER).map_err(write_error)?;
            state.header_written = true;
        }
        for record in &records {
            state.writer.write_record(row(record)).map_err(write_error)?;
        }
        state.writer.flush().map_err(write_error)
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| poisoned("csv"))?;
        state.writer.flush().map_err(write_error)
    }
}
