//! CSV output
//!
//! The header is `url` followed by the selector rule names. Multiple values
//! for one rule share a cell, joined by ` | `. A failed or blocked record puts
//! its reason in the first rule column and leaves the others empty.

use crate::output::traits::{OutputError, OutputResult, RecordWriter};
use crate::record::{Outcome, Record};
use std::io::Write;

/// Separator between multiple values in one cell
pub const VALUE_SEPARATOR: &str = " | ";

/// Writes records as CSV rows
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<String>,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a writer and emits the header row
    ///
    /// # Arguments
    ///
    /// * `sink` - Where rows are written
    /// * `columns` - Selector rule names, in order
    pub fn new(sink: W, columns: Vec<String>) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(sink);

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push("url");
        header.extend(columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        Ok(Self { writer, columns })
    }

    /// Consumes the writer, returning the underlying sink
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Write(e.to_string()))
    }

    fn row(&self, record: &Record) -> Vec<String> {
        let mut row = Vec::with_capacity(self.columns.len() + 1);
        row.push(record.url.clone());

        let failure = match record.outcome {
            Outcome::Ok => None,
            Outcome::Error => Some("ERROR"),
            Outcome::Blocked => Some("BLOCKED"),
        };

        if let Some(tag) = failure {
            if !self.columns.is_empty() {
                let message = record.error_message().unwrap_or_default();
                row.push(format!("{}: {}", tag, message));
            }
            row.resize(self.columns.len() + 1, String::new());
            return row;
        }

        for column in &self.columns {
            let cell = record
                .data
                .as_ref()
                .and_then(|data| data.get(column))
                .map(|values| values.join(VALUE_SEPARATOR))
                .unwrap_or_default();
            row.push(cell);
        }

        row
    }
}

impl<W: Write> RecordWriter for CsvWriter<W> {
    fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        let row = self.row(record);
        self.writer.write_record(&row)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
