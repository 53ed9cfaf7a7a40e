//! Run statistics for a harvest
//!
//! This module tracks counters gathered while crawling and displays them
//! once the run ends.

use chrono::{DateTime, Utc};

/// Counters collected over one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// List pages loaded (reloads to resume a page are not counted)
    pub pages_visited: u64,

    /// Items extracted and appended
    pub items_recorded: u64,

    /// Items abandoned after every retry failed
    pub items_skipped: u64,

    /// Cells across all records that could not be located
    pub missing_cells: u64,

    /// Attempts beyond the first, over every navigation step
    pub retries: u64,
}

impl CrawlStats {
    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn mark_finished(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Seconds between start and finish, once both are known
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).num_seconds()),
            _ => None,
        }
    }

    /// Items recorded per minute of wall-clock time
    pub fn items_per_minute(&self) -> f64 {
        match self.duration_seconds() {
            Some(seconds) if seconds > 0 => self.items_recorded as f64 * 60.0 / seconds as f64,
            _ => 0.0,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Items recorded: {}", stats.items_recorded);
    println!("  Items skipped: {}", stats.items_skipped);
    println!("  Missing cells: {}", stats.missing_cells);
    println!("  Retries: {}", stats.retries);
    println!();

    if let Some(duration) = stats.duration_seconds() {
        println!(
            "Duration: {} seconds ({:.1} items/min)",
            duration,
            stats.items_per_minute()
        );
    }
}
