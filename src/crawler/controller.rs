//! Crawl controller - the page/item state machine
//!
//! The controller walks list pages in numeric order and the items of each
//! page in slot order. Every navigation step runs under the retry policy;
//! extraction runs once per entered item and its record is appended to the
//! sink. The controller never flushes: it hands the sink back through
//! [`Controller::into_parts`] once a terminal state is reached.

use crate::browser::Browser;
use crate::config::CrawlerConfig;
use crate::crawler::{
    CrawlOutcome, Extractor, NavigationError, Navigator, PageTarget, PageView, RetryError,
    RetryPolicy,
};
use crate::output::{CrawlStats, CsvExporter, Exporter, RecordSink};
use crate::state::{AbortReason, CrawlState, PageCursor};
use tokio_util::sync::CancellationToken;

/// Drives one browsing session through the catalog
pub struct Controller<B, E = CsvExporter> {
    navigator: Navigator<B>,
    extractor: Extractor,
    retry: RetryPolicy,
    sink: RecordSink<E>,
    crawler: CrawlerConfig,
    cancel: CancellationToken,
    stats: CrawlStats,
}

impl<B: Browser, E: Exporter> Controller<B, E> {
    pub fn new(
        navigator: Navigator<B>,
        extractor: Extractor,
        retry: RetryPolicy,
        sink: RecordSink<E>,
        crawler: CrawlerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            navigator,
            extractor,
            retry,
            sink,
            crawler,
            cancel,
            stats: CrawlStats::default(),
        }
    }

    pub fn sink(&self) -> &RecordSink<E> {
        &self.sink
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Releases the collected records and the run statistics
    pub fn into_parts(self) -> (RecordSink<E>, CrawlStats) {
        (self.sink, self.stats)
    }

    /// Runs the state machine until `Done` or `Aborted`
    pub async fn run(&mut self) -> CrawlOutcome {
        self.stats.mark_started();

        let first = PageCursor::at_page(self.crawler.start_page);
        tracing::info!(
            "Starting harvest at page {} ({} columns per record)",
            first.page,
            self.extractor.schema().columns().len()
        );

        let mut state = CrawlState::AtListPage {
            target: self.navigator.page_target(first.page),
            resume_slot: first.slot,
        };

        let outcome = loop {
            if self.cancel.is_cancelled() && !state.is_terminal() {
                tracing::info!("Interrupt received in state {}", state);
                state = CrawlState::Aborted(AbortReason::ExternalInterrupt);
            }
            tracing::trace!("State: {}", state);

            state = match state {
                CrawlState::AtListPage {
                    target,
                    resume_slot,
                } => self.load_list_page(target, resume_slot).await,
                CrawlState::AtItem { page, slot } => self.visit_item(page, slot).await,
                CrawlState::PageExhausted { page, items_seen } => {
                    self.finish_page(page, items_seen).await
                }
                CrawlState::Done => break CrawlOutcome::Done,
                CrawlState::Aborted(reason) => break CrawlOutcome::Aborted(reason),
            };
        };

        self.stats.retries = self.retry.retries_performed();
        self.stats.mark_finished();

        match outcome {
            CrawlOutcome::Done => tracing::info!(
                "Harvest complete: {} records from {} pages",
                self.sink.len(),
                self.stats.pages_visited
            ),
            CrawlOutcome::Aborted(reason) => tracing::warn!(
                "Harvest aborted ({}): keeping {} records",
                reason,
                self.sink.len()
            ),
        }

        outcome
    }

    async fn load_list_page(&mut self, target: PageTarget, resume_slot: u32) -> CrawlState {
        // Only a page reached by advancing can mark the end; the start page and
        // reloads must exist
        let fresh_page = resume_slot == 1 && target.number > self.crawler.start_page;

        let label = format!("Loading list page {}", target.number);
        let navigator = &mut self.navigator;
        let loaded = self
            .retry
            .run(&label, &self.cancel, async || {
                navigator.open_list_page(&target).await
            })
            .await;

        match loaded {
            Ok(page) => {
                if resume_slot == 1 {
                    self.stats.pages_visited += 1;
                    tracing::info!("Page {}: {}", page.number, page.url);
                } else {
                    tracing::debug!(
                        "Reloaded page {}, resuming at slot {}",
                        page.number,
                        resume_slot
                    );
                }
                CrawlState::AtItem {
                    page,
                    slot: resume_slot,
                }
            }
            Err(RetryError::Cancelled) => CrawlState::Aborted(AbortReason::ExternalInterrupt),
            Err(e)
                if fresh_page
                    && e.navigation_error()
                        .is_some_and(NavigationError::marks_catalog_end) =>
            {
                tracing::info!("List page {} is gone ({}), end of catalog", target.number, e);
                CrawlState::Done
            }
            Err(e) => {
                tracing::error!("Giving up on list page {}: {}", target.number, e);
                CrawlState::Aborted(AbortReason::PageLoadFailed)
            }
        }
    }

    async fn visit_item(&mut self, page: PageView, slot: u32) -> CrawlState {
        let cursor = PageCursor {
            page: page.number,
            slot,
        };
        if cursor.past_slot_bound(self.crawler.items_per_page) {
            tracing::debug!("Slot bound reached at {}", cursor);
            return CrawlState::PageExhausted {
                page,
                items_seen: slot - 1,
            };
        }

        let label = format!("Entering item at {}", cursor);
        let navigator = &mut self.navigator;
        let entered = self
            .retry
            .run(&label, &self.cancel, async || {
                navigator.enter_item(&page, slot).await
            })
            .await;

        let item = match entered {
            Ok(item) => item,
            Err(RetryError::Fatal(NavigationError::SlotNotFound { .. })) => {
                tracing::debug!("No item at {}, page {} exhausted", cursor, page.number);
                return CrawlState::PageExhausted {
                    page,
                    items_seen: slot - 1,
                };
            }
            Err(RetryError::Cancelled) => {
                return CrawlState::Aborted(AbortReason::ExternalInterrupt)
            }
            Err(e) => {
                tracing::error!("Skipping item at {}: {}", cursor, e);
                self.stats.items_skipped += 1;
                return CrawlState::AtListPage {
                    target: page.target(),
                    resume_slot: cursor.next_slot().slot,
                };
            }
        };

        let record = self.extractor.extract(self.navigator.browser(), &item).await;
        if self.cancel.is_cancelled() {
            tracing::info!("Interrupted while reading {}, record dropped", item.url);
            return CrawlState::Aborted(AbortReason::ExternalInterrupt);
        }

        self.stats.items_recorded += 1;
        self.stats.missing_cells += record.missing_count() as u64;
        tracing::debug!(
            "Recorded {} at {} ({} missing)",
            item.url,
            cursor,
            record.missing_count()
        );
        self.sink.append(record);

        let label = format!("Returning to page {}", page.number);
        let navigator = &mut self.navigator;
        let returned = self
            .retry
            .run(&label, &self.cancel, async || {
                navigator.return_to_list(&item).await
            })
            .await;

        match returned {
            Ok(page) => CrawlState::AtItem {
                page,
                slot: cursor.next_slot().slot,
            },
            Err(RetryError::Cancelled) => CrawlState::Aborted(AbortReason::ExternalInterrupt),
            Err(e) => {
                tracing::warn!("Could not return to page {}: {}", page.number, e);
                CrawlState::AtListPage {
                    target: page.target(),
                    resume_slot: cursor.next_slot().slot,
                }
            }
        }
    }

    async fn finish_page(&mut self, page: PageView, items_seen: u32) -> CrawlState {
        let cursor = PageCursor::at_page(page.number);
        tracing::info!("Page {} finished after {} slots", page.number, items_seen);

        if cursor.at_ceiling(self.crawler.page_ceiling) {
            tracing::info!("Reached page ceiling at page {}", page.number);
            return CrawlState::Done;
        }
        if items_seen == 0 {
            tracing::info!("Page {} has no items, end of catalog", page.number);
            return CrawlState::Done;
        }

        let label = format!("Advancing past page {}", page.number);
        let navigator = &mut self.navigator;
        let advanced = self
            .retry
            .run(&label, &self.cancel, async || {
                navigator.advance_page(&page).await
            })
            .await;

        match advanced {
            Ok(target) => CrawlState::AtListPage {
                target,
                resume_slot: 1,
            },
            Err(RetryError::Fatal(NavigationError::NoMorePages { .. })) => {
                tracing::info!("No page after page {}, end of catalog", page.number);
                CrawlState::Done
            }
            Err(RetryError::Cancelled) => CrawlState::Aborted(AbortReason::ExternalInterrupt),
            Err(e) => {
                tracing::error!("Cannot advance past page {}: {}", page.number, e);
                CrawlState::Aborted(AbortReason::PageLoadFailed)
            }
        }
    }
}
