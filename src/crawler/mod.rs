//! Crawler module: the traversal and recovery engine
//!
//! This module contains the core crawling logic, including:
//! - Navigation between list pages and item views
//! - Field extraction from item views
//! - Bounded retries with delay for transient failures
//! - The page/item state machine and its terminal flush

mod controller;
mod extractor;
mod navigator;
mod retry;

pub use controller::Controller;
pub use extractor::Extractor;
pub use navigator::{ItemView, Navigator, PageTarget, PageView};
pub use retry::{RetryError, RetryPolicy, RetryState};

use crate::browser::{Browser, BrowserError, HttpBrowser};
use crate::config::Config;
use crate::output::{write_markdown_summary, CrawlStats, CsvExporter, RecordSink};
use crate::schema::FieldSchema;
use crate::state::AbortReason;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failures of a single navigation step
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("List page not ready: {url}")]
    PageNotReady { url: String },

    #[error("No item at slot {slot} of page {page}")]
    SlotNotFound { page: u32, slot: u32 },

    #[error("Timed out waiting for '{locator}' at {url}")]
    NavigationTimeout { url: String, locator: String },

    #[error("No page after page {page}")]
    NoMorePages { page: u32 },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl NavigationError {
    /// Returns true if the step is worth repeating
    ///
    /// Structural absence (`SlotNotFound`, `NoMorePages`) is final: repeating
    /// the same navigation cannot make a missing element appear.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PageNotReady { .. } | Self::NavigationTimeout { .. } => true,
            Self::SlotNotFound { .. } | Self::NoMorePages { .. } => false,
            Self::Browser(e) => e.is_retryable(),
        }
    }

    /// Returns true when a failed list page load means the catalog has ended
    ///
    /// Sites either answer 404/410 past the last page or serve a page without
    /// the list marker.
    pub fn marks_catalog_end(&self) -> bool {
        match self {
            Self::NoMorePages { .. } | Self::PageNotReady { .. } => true,
            Self::Browser(BrowserError::Http { status, .. }) => matches!(status, 404 | 410),
            _ => false,
        }
    }
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Ran out of pages or reached the page ceiling
    Done,

    /// Stopped early; collected records were still exported
    Aborted(AbortReason),
}

impl CrawlOutcome {
    /// Whether the process should exit successfully
    pub fn is_success(&self) -> bool {
        match self {
            Self::Done => true,
            Self::Aborted(reason) => reason.is_graceful(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Aborted(reason) => reason.as_str(),
        }
    }
}

/// Result of a complete harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub outcome: CrawlOutcome,
    pub stats: CrawlStats,
    /// Rows written to the export
    pub records: usize,
    pub export_path: PathBuf,
}

/// Runs a crawl over `browser` and flushes the export exactly once
///
/// The flush happens whatever the outcome: normal completion, page-load
/// exhaustion, or cancellation of `cancel` by an interrupt.
///
/// # Returns
///
/// * `Ok(HarvestReport)` - The crawl ended and the export was written
/// * `Err(HarvestError)` - The export could not be written
pub async fn harvest<B: Browser>(
    config: &Config,
    browser: B,
    cancel: CancellationToken,
) -> crate::Result<HarvestReport> {
    let schema = Arc::new(FieldSchema::from_config(&config.schema));
    let sink = RecordSink::new(
        schema.columns().to_vec(),
        CsvExporter::from_config(&config.output),
    );
    let navigator = Navigator::new(
        browser,
        config.site.clone(),
        Duration::from_millis(config.crawler.ready_timeout_ms),
    );

    let mut controller = Controller::new(
        navigator,
        Extractor::new(schema),
        RetryPolicy::from_config(&config.crawler),
        sink,
        config.crawler.clone(),
        cancel,
    );

    let outcome = controller.run().await;
    let (sink, stats) = controller.into_parts();

    if sink.is_empty() {
        tracing::warn!("No records were collected");
    }
    sink.flush()?;
    tracing::info!(
        "Exported {} records to {}",
        sink.len(),
        sink.destination().display()
    );

    let report = HarvestReport {
        outcome,
        stats,
        records: sink.len(),
        export_path: sink.destination().to_path_buf(),
    };

    if let Some(summary_path) = &config.output.summary_path {
        match write_markdown_summary(&report, std::path::Path::new(summary_path)) {
            Ok(()) => tracing::info!("Summary written to {}", summary_path),
            Err(e) => tracing::error!("Failed to write summary {}: {}", summary_path, e),
        }
    }

    Ok(report)
}

/// Runs a harvest with the bundled HTTP browsing session
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::load_config;
/// use catalog_harvest::crawler::run_harvest;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(&config, CancellationToken::new()).await?;
/// println!("{} records", report.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    cancel: CancellationToken,
) -> crate::Result<HarvestReport> {
    let browser = HttpBrowser::from_config(&config.user_agent, &config.crawler)?;
    harvest(config, browser, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;
    use crate::config::parse_config;
    use tempfile::TempDir;

    fn harvest_config(dir: &std::path::Path) -> Config {
        let content = format!(
            r##"
[crawler]
max-retries = 2
retry-delay-ms = 1
ready-timeout-ms = 50

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[site]
list-url = "https://catalog.test/exhibitors?page={{page}}"
list-ready = "ul.list"
item-link = "ul.list a"
item-ready = "h1"

[output]
path = "{export}"

[[schema.fields]]
name = "Exhibitor"
kind = "text"
locator = "h1"
"##,
            export = dir.join("exhibitors.csv").display(),
        );
        parse_config(&content).unwrap()
    }

    fn item_url(id: &str) -> String {
        format!("https://catalog.test/exhibitors/{id}")
    }

    fn catalog() -> FakeBrowser {
        let list = ["acme", "globex", "initech"]
            .iter()
            .map(|id| format!(r#"<li><a href="/exhibitors/{id}">{id}</a></li>"#))
            .collect::<String>();
        let mut browser = FakeBrowser::new().with_page(
            "https://catalog.test/exhibitors?page=1",
            &format!(r#"<html><body><ul class="list">{list}</ul></body></html>"#),
        );
        for name in ["Acme", "Globex", "Initech"] {
            browser = browser.with_page(
                &item_url(&name.to_lowercase()),
                &format!("<html><body><h1>{name}</h1></body></html>"),
            );
        }
        browser
    }

    #[tokio::test]
    async fn test_interrupt_mid_run_exports_completed_records() {
        let dir = TempDir::new().unwrap();
        let config = harvest_config(dir.path());
        let cancel = CancellationToken::new();
        let browser = catalog().cancel_on_visit(&item_url("initech"), cancel.clone());

        let report = harvest(&config, browser, cancel).await.unwrap();

        assert_eq!(
            report.outcome,
            CrawlOutcome::Aborted(AbortReason::ExternalInterrupt)
        );
        assert!(report.outcome.is_success());
        assert_eq!(report.records, 2);

        let exported = std::fs::read_to_string(&report.export_path).unwrap();
        let rows: Vec<&str> = exported.lines().collect();
        assert_eq!(rows, vec!["Exhibitor", "Acme", "Globex"]);
    }

    #[tokio::test]
    async fn test_catalog_end_exports_every_record() {
        let dir = TempDir::new().unwrap();
        let config = harvest_config(dir.path());

        // Page 2 is not served
        let report = harvest(&config, catalog(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, CrawlOutcome::Done);
        assert_eq!(report.records, 3);
        let exported = std::fs::read_to_string(&report.export_path).unwrap();
        assert_eq!(exported.lines().count(), 4);
    }

    #[test]
    fn test_navigation_error_classification() {
        assert!(NavigationError::PageNotReady {
            url: "https://example.com/list?page=1".into()
        }
        .is_retryable());
        assert!(NavigationError::NavigationTimeout {
            url: "https://example.com/e/1".into(),
            locator: "#exhibitor-header".into()
        }
        .is_retryable());
        assert!(NavigationError::Browser(BrowserError::Timeout {
            url: "https://example.com".into()
        })
        .is_retryable());

        assert!(!NavigationError::SlotNotFound { page: 1, slot: 4 }.is_retryable());
        assert!(!NavigationError::NoMorePages { page: 9 }.is_retryable());
        assert!(!NavigationError::Browser(BrowserError::Http {
            url: "https://example.com".into(),
            status: 404
        })
        .is_retryable());
    }

    #[test]
    fn test_catalog_end_signals() {
        assert!(NavigationError::NoMorePages { page: 2 }.marks_catalog_end());
        assert!(NavigationError::PageNotReady { url: String::new() }.marks_catalog_end());
        assert!(NavigationError::Browser(BrowserError::Http {
            url: "https://example.com/list?page=9".into(),
            status: 404
        })
        .marks_catalog_end());
        assert!(NavigationError::Browser(BrowserError::Http {
            url: "https://example.com/list?page=9".into(),
            status: 410
        })
        .marks_catalog_end());

        assert!(!NavigationError::Browser(BrowserError::Http {
            url: "https://example.com/list?page=9".into(),
            status: 500
        })
        .marks_catalog_end());
        assert!(!NavigationError::Browser(BrowserError::Timeout {
            url: "https://example.com/list?page=9".into()
        })
        .marks_catalog_end());
        assert!(!NavigationError::SlotNotFound { page: 1, slot: 4 }.marks_catalog_end());
    }

    #[test]
    fn test_outcome_success() {
        assert!(CrawlOutcome::Done.is_success());
        assert!(CrawlOutcome::Aborted(AbortReason::ExternalInterrupt).is_success());
        assert!(!CrawlOutcome::Aborted(AbortReason::PageLoadFailed).is_success());
    }
}
