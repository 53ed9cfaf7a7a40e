//! Catalog navigation over a browsing session
//!
//! Every operation is safe to repeat: each one first restores the session to
//! the view it expects, so the retry policy can re-run a step that failed
//! halfway through.

use crate::browser::{resolve_link, Browser, BrowserError};
use crate::config::{Pagination, SiteConfig};
use crate::crawler::NavigationError;
use std::time::Duration;
use url::Url;

/// A list page to load: its number and URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub number: u32,
    pub url: String,
}

impl PageTarget {
    pub fn new(number: u32, url: impl Into<String>) -> Self {
        Self {
            number,
            url: url.into(),
        }
    }
}

/// A loaded list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub number: u32,
    /// URL the session reported once the list was ready
    pub url: String,
}

impl PageView {
    /// Target that reloads this page
    pub fn target(&self) -> PageTarget {
        PageTarget::new(self.number, self.url.clone())
    }
}

/// An entered item detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    /// The list page the item was entered from
    pub page: PageView,
    pub slot: u32,
    pub url: String,
}

/// Moves a browsing session between list pages and item views
pub struct Navigator<B> {
    browser: B,
    site: SiteConfig,
    ready_timeout: Duration,
}

impl<B: Browser> Navigator<B> {
    pub fn new(browser: B, site: SiteConfig, ready_timeout: Duration) -> Self {
        Self {
            browser,
            site,
            ready_timeout,
        }
    }

    /// The session, for read-only extraction
    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Target for a numbered list page built from the URL template
    pub fn page_target(&self, number: u32) -> PageTarget {
        PageTarget::new(number, self.site.list_url_for(number))
    }

    /// Loads a list page and waits for its list marker
    pub async fn open_list_page(
        &mut self,
        target: &PageTarget,
    ) -> Result<PageView, NavigationError> {
        self.browser.navigate_to(&target.url).await?;
        self.wait_for_list(&target.url).await?;

        Ok(PageView {
            number: target.number,
            url: self
                .browser
                .current_url()
                .unwrap_or_else(|| target.url.clone()),
        })
    }

    /// Enters the item at 1-based `slot` of `page`
    ///
    /// `SlotNotFound` means the page holds fewer items than `slot`.
    pub async fn enter_item(
        &mut self,
        page: &PageView,
        slot: u32,
    ) -> Result<ItemView, NavigationError> {
        // A previous attempt may have left the session on the item
        self.ensure_on_list(page).await?;

        let items = self.browser.find_all(&self.site.item_link).await?;
        let index = slot.saturating_sub(1) as usize;
        let element = items.get(index).ok_or(NavigationError::SlotNotFound {
            page: page.number,
            slot,
        })?;

        self.browser.click(element).await?;

        let url = self.browser.current_url().unwrap_or_default();
        if let Some(item_ready) = &self.site.item_ready {
            let ready = self
                .browser
                .wait_for_selector(item_ready, self.ready_timeout)
                .await?;
            if ready.is_none() {
                return Err(NavigationError::NavigationTimeout {
                    url,
                    locator: item_ready.clone(),
                });
            }
        }

        Ok(ItemView {
            page: page.clone(),
            slot,
            url,
        })
    }

    /// Goes back from an item to the list page it was entered from
    pub async fn return_to_list(&mut self, item: &ItemView) -> Result<PageView, NavigationError> {
        self.ensure_on_list(&item.page).await?;
        Ok(item.page.clone())
    }

    /// Finds the list page following `page`
    ///
    /// `NoMorePages` is the normal end of the catalog. A next-page link is
    /// followed by resolving its target, which is what activating it does;
    /// controls without a link target are clicked.
    pub async fn advance_page(&mut self, page: &PageView) -> Result<PageTarget, NavigationError> {
        self.ensure_on_list(page).await?;
        let next_number = page.number + 1;
        let no_more = NavigationError::NoMorePages { page: page.number };

        match self.site.pagination {
            Pagination::Url => {
                if let Some(next_page) = &self.site.next_page {
                    if self.browser.find_all(next_page).await?.is_empty() {
                        return Err(no_more);
                    }
                }
                Ok(self.page_target(next_number))
            }
            Pagination::NextControl => {
                let Some(next_page) = &self.site.next_page else {
                    return Err(no_more);
                };
                let Some(control) = self.browser.find_all(next_page).await?.into_iter().next()
                else {
                    return Err(no_more);
                };

                let base = Url::parse(&page.url).ok();
                let resolved = control
                    .href
                    .as_deref()
                    .zip(base.as_ref())
                    .and_then(|(href, base)| resolve_link(href, base));
                if let Some(url) = resolved {
                    return Ok(PageTarget::new(next_number, url.to_string()));
                }

                match self.browser.click(&control).await {
                    Ok(()) => {}
                    Err(BrowserError::NotClickable(_)) => return Err(no_more),
                    Err(e) => return Err(e.into()),
                }
                let url = self
                    .browser
                    .current_url()
                    .ok_or(BrowserError::NoPageLoaded)?;
                Ok(PageTarget::new(next_number, url))
            }
        }
    }

    /// Puts the session back on `page` and waits for its list marker
    async fn ensure_on_list(&mut self, page: &PageView) -> Result<(), NavigationError> {
        if self.browser.current_url().as_deref() == Some(page.url.as_str()) {
            return Ok(());
        }

        match self.browser.back().await {
            Ok(()) => {}
            Err(e) if e.is_retryable() => return Err(e.into()),
            Err(e) => tracing::debug!("Back navigation unavailable: {}", e),
        }

        if self.browser.current_url().as_deref() != Some(page.url.as_str()) {
            tracing::debug!("Reloading list page {} directly", page.number);
            self.browser.navigate_to(&page.url).await?;
        }

        self.wait_for_list(&page.url).await
    }

    async fn wait_for_list(&mut self, url: &str) -> Result<(), NavigationError> {
        let marker = self
            .browser
            .wait_for_selector(&self.site.list_ready, self.ready_timeout)
            .await?;
        if marker.is_none() {
            return Err(NavigationError::PageNotReady {
                url: url.to_string(),
            });
        }
        Ok(())
    }
}
