//! Exporter trait and output error types

use crate::schema::ExhibitorRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to replace {path}: {message}")]
    Persist { path: String, message: String },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a complete record set to a destination
///
/// An export always replaces whatever the destination held before, so
/// exporting the same records twice leaves identical content.
pub trait Exporter {
    /// Writes the header row and every record, in order
    ///
    /// # Arguments
    ///
    /// * `columns` - Header row, in schema order
    /// * `records` - Rows in append order
    fn export(&self, columns: &[String], records: &[ExhibitorRecord]) -> OutputResult<()>;

    /// Where exports are written
    fn destination(&self) -> &Path;
}
