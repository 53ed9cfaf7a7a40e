/// Crawl state machine definitions
///
/// This module defines every state the crawl controller can be in.
use crate::crawler::{PageTarget, PageView};
use std::fmt;

/// Why a crawl stopped before running out of pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// A list page (or the page advance) failed after every retry
    PageLoadFailed,

    /// An operator interrupt (SIGINT/SIGTERM) was received
    ExternalInterrupt,
}

impl AbortReason {
    /// Whether the abort should still exit successfully
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::ExternalInterrupt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageLoadFailed => "page_load_failed",
            Self::ExternalInterrupt => "external_interrupt",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the controller's position in the traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    // ===== Active States =====
    /// The list page must be (re)loaded; traversal resumes at `resume_slot`
    AtListPage { target: PageTarget, resume_slot: u32 },

    /// The list page is loaded and `slot` is the next item to attempt
    AtItem { page: PageView, slot: u32 },

    /// Every slot of the page has been attempted
    PageExhausted { page: PageView, items_seen: u32 },

    // ===== Terminal States =====
    /// No further page exists or the page ceiling was reached
    Done,

    /// The crawl stopped early; collected records are still flushed
    Aborted(AbortReason),
}

impl CrawlState {
    /// Returns true for `Done` and `Aborted`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted(_))
    }

    /// Page number the state refers to, if any
    pub fn page_number(&self) -> Option<u32> {
        match self {
            Self::AtListPage { target, .. } => Some(target.number),
            Self::AtItem { page, .. } | Self::PageExhausted { page, .. } => Some(page.number),
            Self::Done | Self::Aborted(_) => None,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::AtListPage { .. } => "at_list_page",
            Self::AtItem { .. } => "at_item",
            Self::PageExhausted { .. } => "page_exhausted",
            Self::Done => "done",
            Self::Aborted(_) => "aborted",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtListPage {
                target,
                resume_slot,
            } => write!(f, "at_list_page({}, slot {})", target.number, resume_slot),
            Self::AtItem { page, slot } => write!(f, "at_item({}, {})", page.number, slot),
            Self::PageExhausted { page, .. } => write!(f, "page_exhausted({})", page.number),
            Self::Done => write!(f, "done"),
            Self::Aborted(reason) => write!(f, "aborted({})", reason),
        }
    }
}
