//! Catalog-Harvest: a resilient catalog record extractor
//!
//! This crate walks a paginated catalog (list pages holding a bounded number of
//! item slots), visits each item's detail view, extracts a fixed field schema and
//! exports the collected records as a rectangular table. Transient page-load
//! failures are retried, and an interrupt or fatal failure still flushes every
//! record collected so far.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod schema;
pub mod state;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, CrawlOutcome, HarvestReport};
pub use schema::{ExhibitorRecord, FieldSchema, FieldValue};
pub use state::{AbortReason, CrawlState, PageCursor};
