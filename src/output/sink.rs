//! In-memory record accumulator with a whole-set flush

use crate::output::csv_export::CsvExporter;
use crate::output::traits::{Exporter, OutputResult};
use crate::schema::ExhibitorRecord;
use std::path::Path;

/// Collects records in append order and exports them on demand
///
/// `flush` always writes the complete set, so it may be called any number of
/// times and each call leaves the same content behind.
#[derive(Debug)]
pub struct RecordSink<E = CsvExporter> {
    columns: Vec<String>,
    records: Vec<ExhibitorRecord>,
    exporter: E,
}

impl<E: Exporter> RecordSink<E> {
    pub fn new(columns: Vec<String>, exporter: E) -> Self {
        Self {
            columns,
            records: Vec::new(),
            exporter,
        }
    }

    /// Adds a record after every record appended so far
    pub fn append(&mut self, record: ExhibitorRecord) {
        debug_assert!(
            record.columns().eq(self.columns.iter().map(String::as_str)),
            "record columns differ from the sink's header"
        );
        self.records.push(record);
    }

    /// Writes the header and every collected record to the destination
    pub fn flush(&self) -> OutputResult<()> {
        self.exporter.export(&self.columns, &self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExhibitorRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn destination(&self) -> &Path {
        self.exporter.destination()
    }
}
