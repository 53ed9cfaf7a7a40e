//! Scripted in-memory browsing session for unit tests

use crate::browser::dom::{normalize_text, resolve_link, select_in_document, select_in_fragment};
use crate::browser::{Browser, BrowserError, BrowserResult, ElementHandle};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Serves fixed HTML per URL and can inject transient failures
#[derive(Default)]
pub(crate) struct FakeBrowser {
    pages: HashMap<String, String>,
    failures: HashMap<String, u32>,
    current: Option<String>,
    history: Vec<String>,
    cancel_on_visit: Option<(String, CancellationToken)>,
    /// Every URL a navigation was attempted for, in order
    pub visits: Vec<String>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// The next `times` navigations to `url` time out
    pub(crate) fn failing(mut self, url: &str, times: u32) -> Self {
        self.failures.insert(url.to_string(), times);
        self
    }

    /// Cancels `token` when `url` is loaded
    pub(crate) fn cancel_on_visit(mut self, url: &str, token: CancellationToken) -> Self {
        self.cancel_on_visit = Some((url.to_string(), token));
        self
    }

    pub(crate) fn visit_count(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    fn load(&mut self, url: &str) -> BrowserResult<()> {
        self.visits.push(url.to_string());

        if let Some((trigger, token)) = &self.cancel_on_visit {
            if trigger == url {
                token.cancel();
            }
        }

        if let Some(remaining) = self.failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::Timeout {
                    url: url.to_string(),
                });
            }
        }

        if !self.pages.contains_key(url) {
            return Err(BrowserError::Http {
                url: url.to_string(),
                status: 404,
            });
        }

        Ok(())
    }

    fn html(&self) -> BrowserResult<&str> {
        let url = self.current.as_ref().ok_or(BrowserError::NoPageLoaded)?;
        Ok(self.pages.get(url).map(String::as_str).unwrap_or_default())
    }
}

impl Browser for FakeBrowser {
    async fn navigate_to(&mut self, url: &str) -> BrowserResult<()> {
        self.load(url)?;
        if let Some(previous) = self.current.replace(url.to_string()) {
            self.history.push(previous);
        }
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        locator: &str,
        _timeout: Duration,
    ) -> BrowserResult<Option<ElementHandle>> {
        Ok(select_in_document(self.html()?, locator)?.into_iter().next())
    }

    async fn find_all(&self, locator: &str) -> BrowserResult<Vec<ElementHandle>> {
        select_in_document(self.html()?, locator)
    }

    async fn find_within(
        &self,
        element: &ElementHandle,
        locator: &str,
    ) -> BrowserResult<Vec<ElementHandle>> {
        select_in_fragment(&element.html, locator)
    }

    async fn click(&mut self, element: &ElementHandle) -> BrowserResult<()> {
        let base = self.current.clone().ok_or(BrowserError::NoPageLoaded)?;
        let base = Url::parse(&base).map_err(|source| BrowserError::InvalidUrl {
            url: base.clone(),
            source,
        })?;
        let target = element
            .href
            .as_deref()
            .and_then(|href| resolve_link(href, &base))
            .ok_or_else(|| BrowserError::NotClickable(element.text.clone()))?;
        self.navigate_to(target.as_str()).await
    }

    async fn back(&mut self) -> BrowserResult<()> {
        let previous = self.history.last().cloned().ok_or(BrowserError::NoHistory)?;
        self.load(&previous)?;
        self.history.pop();
        self.current = Some(previous);
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current.clone()
    }

    async fn text_of(&self, element: &ElementHandle) -> Option<String> {
        Some(normalize_text(&element.text)).filter(|t| !t.is_empty())
    }
}
