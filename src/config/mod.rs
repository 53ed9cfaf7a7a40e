//! Configuration module for Catalog-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawl starts at page {}", config.crawler.start_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExportFormat, FieldEntry, FieldKindEntry, OutputConfig, Pagination,
    SchemaConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

/// Re-checks crawler settings after command-line overrides were applied
pub fn revalidate_crawler(config: &CrawlerConfig) -> Result<(), crate::ConfigError> {
    validation::validate_crawler_config(config)
}
