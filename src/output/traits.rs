//! Output writer traits and types
//!
//! This module defines the trait interface for record writers and the
//! errors they can produce.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record writers
///
/// A writer receives records one at a time in the order they should appear
/// and must be finished to flush any buffered output.
pub trait RecordWriter {
    /// Writes a single record
    ///
    /// # Arguments
    ///
    /// * `record` - The record to write
    fn write_record(&mut self, record: &Record) -> OutputResult<()>;

    /// Flushes buffered output
    fn finish(&mut self) -> OutputResult<()>;

    /// Writes every record, then finishes
    fn write_all(&mut self, records: &[Record]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        self.finish()
    }
}
