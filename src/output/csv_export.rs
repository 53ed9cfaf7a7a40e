//! Delimited-text exporter (CSV or TSV)

use crate::config::OutputConfig;
use crate::output::traits::{Exporter, OutputError, OutputResult};
use crate::schema::ExhibitorRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes records as a rectangular delimited table
///
/// The table is written to a temporary file next to the destination and
/// renamed over it, so readers never observe a half-written export.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
    delimiter: u8,
    missing_value: String,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, missing_value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter,
            missing_value: missing_value.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            &config.path,
            config.format.delimiter(),
            config.missing_value.clone(),
        )
    }

    fn render(&self, columns: &[String], records: &[ExhibitorRecord]) -> OutputResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer.write_record(columns)?;
        for record in records {
            if record.len() != columns.len() {
                return Err(OutputError::Write(format!(
                    "record has {} cells, header has {}",
                    record.len(),
                    columns.len()
                )));
            }
            writer.write_record(record.values().map(|v| v.render(&self.missing_value)))?;
        }

        writer
            .into_inner()
            .map_err(|e| OutputError::Write(e.to_string()))
    }
}

impl Exporter for CsvExporter {
    fn export(&self, columns: &[String], records: &[ExhibitorRecord]) -> OutputResult<()> {
        let bytes = self.render(columns, records)?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|e| OutputError::Persist {
                path: self.path.display().to_string(),
                message: e.error.to_string(),
            })?;

        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.path
    }
}
