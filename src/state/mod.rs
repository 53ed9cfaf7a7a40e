//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the controller's state machine (list page, item, exhausted, terminal)
//! - `AbortReason`: why a crawl stopped early
//! - `PageCursor`: the (page, slot) position within the catalog

mod crawl_state;
mod cursor;

// Re-export main types
pub use crawl_state::{AbortReason, CrawlState};
pub use cursor::PageCursor;
