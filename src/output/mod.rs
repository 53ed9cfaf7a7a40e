//! Output module for exporting records and reporting runs
//!
//! This module handles:
//! - Accumulating extracted records in append order
//! - Exporting them as a CSV or TSV table
//! - Recording run statistics and an optional markdown summary

mod csv_export;
mod markdown;
mod sink;
pub mod stats;
mod traits;

pub use csv_export::CsvExporter;
pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use sink::RecordSink;
pub use stats::{print_statistics, CrawlStats};
pub use traits::{Exporter, OutputError, OutputResult};
