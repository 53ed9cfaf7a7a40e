//! HTTP browsing session
//!
//! This module implements the [`Browser`] interface over plain HTTP:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for navigation, with a history stack for `back`
//! - Ready-marker polling by re-fetching the current page
//! - Error classification into retryable and fatal failures

use crate::browser::dom::{normalize_text, resolve_link, select_in_document, select_in_fragment};
use crate::browser::{Browser, BrowserError, BrowserResult, ElementHandle};
use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::UserAgentConfig;
/// use catalog_harvest::browser::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "CatalogHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// A browsing session that fetches pages over HTTP
///
/// The current view is the last fetched document. `back` re-fetches the
/// previous URL, so every view reflects the server's latest response.
pub struct HttpBrowser {
    client: Client,
    current: Option<LoadedPage>,
    history: Vec<Url>,
    poll_interval: Duration,
}

impl HttpBrowser {
    /// Creates a session over an existing client
    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self {
            client,
            current: None,
            history: Vec::new(),
            poll_interval,
        }
    }

    /// Creates a session with the configured user agent and poll interval
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, BrowserError> {
        let client = build_http_client(user_agent).map_err(|e| BrowserError::Network {
            url: String::new(),
            message: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Self::new(
            client,
            Duration::from_millis(crawler.poll_interval_ms),
        ))
    }

    fn loaded(&self) -> BrowserResult<&LoadedPage> {
        self.current.as_ref().ok_or(BrowserError::NoPageLoaded)
    }

    /// Fetches a URL and classifies failures
    ///
    /// | Condition | Error | Retryable |
    /// |-----------|-------|-----------|
    /// | Timeout | `Timeout` | yes |
    /// | Connection failure | `Network` | yes |
    /// | HTTP 429 / 5xx | `Http` | yes |
    /// | Other non-2xx | `Http` | no |
    async fn fetch(&self, url: &Url) -> BrowserResult<LoadedPage> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                BrowserError::Timeout {
                    url: url.to_string(),
                }
            } else {
                BrowserError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| BrowserError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(LoadedPage {
            url: final_url,
            html,
        })
    }

    fn parse_url(url: &str) -> BrowserResult<Url> {
        Url::parse(url).map_err(|source| BrowserError::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }

    fn first_match(&self, locator: &str) -> BrowserResult<Option<ElementHandle>> {
        let page = self.loaded()?;
        Ok(select_in_document(&page.html, locator)?.into_iter().next())
    }
}

impl Browser for HttpBrowser {
    async fn navigate_to(&mut self, url: &str) -> BrowserResult<()> {
        let url = Self::parse_url(url)?;
        tracing::debug!("GET {}", url);
        let page = self.fetch(&url).await?;

        if let Some(previous) = self.current.take() {
            self.history.push(previous.url);
        }
        self.current = Some(page);
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        locator: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<ElementHandle>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(found) = self.first_match(locator)? {
                return Ok(Some(found));
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("Locator '{}' did not appear within {:?}", locator, timeout);
                return Ok(None);
            }

            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;

            // Reload the current view; keep the stale snapshot on transient failures
            let url = self.loaded()?.url.clone();
            match self.fetch(&url).await {
                Ok(page) => self.current = Some(page),
                Err(e) if e.is_retryable() => {
                    tracing::debug!("Reload of {} failed while waiting: {}", url, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn find_all(&self, locator: &str) -> BrowserResult<Vec<ElementHandle>> {
        let page = self.loaded()?;
        select_in_document(&page.html, locator)
    }

    async fn find_within(
        &self,
        element: &ElementHandle,
        locator: &str,
    ) -> BrowserResult<Vec<ElementHandle>> {
        select_in_fragment(&element.html, locator)
    }

    async fn click(&mut self, element: &ElementHandle) -> BrowserResult<()> {
        let base = self.loaded()?.url.clone();
        let target = element
            .href
            .as_deref()
            .and_then(|href| resolve_link(href, &base))
            .ok_or_else(|| BrowserError::NotClickable(element.text.clone()))?;

        self.navigate_to(target.as_str()).await
    }

    async fn back(&mut self) -> BrowserResult<()> {
        let previous = self.history.last().cloned().ok_or(BrowserError::NoHistory)?;
        let page = self.fetch(&previous).await?;
        self.history.pop();
        self.current = Some(page);
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(|page| page.url.to_string())
    }

    async fn text_of(&self, element: &ElementHandle) -> Option<String> {
        let text = normalize_text(&element.text);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
