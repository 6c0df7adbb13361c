//! JSON-Lines output
//!
//! One JSON object per record, one record per line.

use crate::output::traits::{OutputResult, RecordWriter};
use crate::record::Record;
use std::io::Write;

/// Writes records as JSON-Lines
pub struct JsonlWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the writer, returning the underlying sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordWriter for JsonlWriter<W> {
    fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
