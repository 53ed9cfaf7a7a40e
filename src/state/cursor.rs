/// Position of the crawl within the catalog
use std::fmt;

/// (page number, item slot), both 1-based
///
/// The slot advances after every attempt on the current page; the page
/// advances only once the current page is exhausted, resetting the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor {
    pub page: u32,
    pub slot: u32,
}

impl PageCursor {
    /// Cursor at slot 1 of `page`
    pub fn at_page(page: u32) -> Self {
        Self {
            page: page.max(1),
            slot: 1,
        }
    }

    /// The next slot on the same page
    pub fn next_slot(self) -> Self {
        Self {
            page: self.page,
            slot: self.slot + 1,
        }
    }

    /// Whether the slot lies beyond the per-page bound
    pub fn past_slot_bound(&self, items_per_page: u32) -> bool {
        self.slot > items_per_page
    }

    /// Whether the page has reached the configured ceiling
    pub fn at_ceiling(&self, ceiling: Option<u32>) -> bool {
        ceiling.is_some_and(|ceiling| self.page >= ceiling)
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} slot {}", self.page, self.slot)
    }
}
