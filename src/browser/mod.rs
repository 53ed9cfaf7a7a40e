//! Browsing collaborator interface
//!
//! The crawl engine never talks to a network or a rendering engine directly.
//! It drives a [`Browser`] session: navigate, wait for a marker, look up
//! elements, click, go back and read text. Locators are CSS selectors supplied
//! by configuration; the engine assumes nothing about the markup.
//!
//! [`HttpBrowser`] is the bundled implementation, backed by `reqwest` for
//! transport and `scraper` for element lookup.

mod dom;
#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use dom::{normalize_text, resolve_link, select_in_document, select_in_fragment};
pub use http::{build_http_client, HttpBrowser};

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browsing session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },

    #[error("Element is not clickable (no link target): {0}")]
    NotClickable(String),

    #[error("No page is loaded in the session")]
    NoPageLoaded,

    #[error("No previous page to go back to")]
    NoHistory,

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

impl BrowserError {
    /// Returns true if repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for browsing operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// A detached snapshot of one element in the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Outer HTML of the element, used for scoped lookups
    pub html: String,

    /// Whitespace-normalized text content
    pub text: String,

    /// Link target, if the element (or its first descendant link) has one
    pub href: Option<String>,
}

/// Primitive operations of a single browsing session
///
/// Every navigation mutates the session's current view, so one session
/// serves one crawl at a time.
pub trait Browser: Send {
    /// Loads `url` as the current view
    fn navigate_to(&mut self, url: &str) -> impl Future<Output = BrowserResult<()>> + Send;

    /// Waits up to `timeout` for `locator` to match in the current view
    fn wait_for_selector(
        &mut self,
        locator: &str,
        timeout: Duration,
    ) -> impl Future<Output = BrowserResult<Option<ElementHandle>>> + Send;

    /// All matches of `locator` in the current view, in document order
    fn find_all(
        &self,
        locator: &str,
    ) -> impl Future<Output = BrowserResult<Vec<ElementHandle>>> + Send;

    /// All matches of `locator` inside `element`
    fn find_within(
        &self,
        element: &ElementHandle,
        locator: &str,
    ) -> impl Future<Output = BrowserResult<Vec<ElementHandle>>> + Send;

    /// Activates `element`, following its link target
    fn click(&mut self, element: &ElementHandle) -> impl Future<Output = BrowserResult<()>> + Send;

    /// Returns to the previously loaded view
    fn back(&mut self) -> impl Future<Output = BrowserResult<()>> + Send;

    /// URL of the current view
    fn current_url(&self) -> Option<String>;

    /// Text of `element`, `None` when it has no visible text
    fn text_of(&self, element: &ElementHandle) -> impl Future<Output = Option<String>> + Send;
}
