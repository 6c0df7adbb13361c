//! Output module for writing scrape results
//!
//! This module handles:
//! - Writing records as JSON-Lines or CSV
//! - Summarizing a run on the console

mod csv_output;
mod jsonl_output;
pub mod stats;
mod traits;

pub use csv_output::{CsvWriter, VALUE_SEPARATOR};
pub use jsonl_output::JsonlWriter;
pub use stats::{format_record_line, print_record_lines, print_statistics, RunStatistics};
pub use traits::{OutputError, OutputResult, RecordWriter};

use crate::record::Record;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

/// Supported output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "json-lines" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => write!(f, "jsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Writes records to a file
///
/// # Arguments
///
/// * `path` - Destination file (created or truncated)
/// * `format` - Output format
/// * `records` - The records, in the order they should appear
/// * `columns` - Selector rule names, used as CSV columns
///
/// # Returns
///
/// * `Ok(())` - Every record was written
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_records(
    path: &Path,
    format: OutputFormat,
    records: &[Record],
    columns: &[String],
) -> OutputResult<()> {
    let file = BufWriter::new(File::create(path)?);

    match format {
        OutputFormat::Jsonl => JsonlWriter::new(file).write_all(records)?,
        OutputFormat::Csv => CsvWriter::new(file, columns.to_vec())?.write_all(records)?,
    }

    tracing::info!(
        "Wrote {} records to {} ({})",
        records.len(),
        path.display(),
        format
    );
    Ok(())
}
