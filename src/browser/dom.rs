//! Element lookup over HTML snapshots
//!
//! `scraper` documents are not `Send`, so every lookup parses, selects and
//! returns detached [`ElementHandle`]s before any await point.

use crate::browser::{BrowserError, BrowserResult, ElementHandle};
use scraper::{ElementRef, Html, Selector};
use url::Url;

fn parse_selector(locator: &str) -> BrowserResult<Selector> {
    Selector::parse(locator).map_err(|e| BrowserError::InvalidLocator {
        locator: locator.to_string(),
        message: e.to_string(),
    })
}

/// Selects every element matching `locator` in a full HTML document
///
/// # Example
///
/// ```
/// use catalog_harvest::browser::select_in_document;
///
/// let html = r#"<ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>"#;
/// let links = select_in_document(html, "li > a").unwrap();
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[1].href.as_deref(), Some("/b"));
/// ```
pub fn select_in_document(html: &str, locator: &str) -> BrowserResult<Vec<ElementHandle>> {
    let selector = parse_selector(locator)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).map(to_handle).collect())
}

/// Selects every element matching `locator` inside an element's outer HTML
pub fn select_in_fragment(fragment: &str, locator: &str) -> BrowserResult<Vec<ElementHandle>> {
    let selector = parse_selector(locator)?;
    let document = Html::parse_fragment(fragment);
    Ok(document.select(&selector).map(to_handle).collect())
}

fn to_handle(element: ElementRef<'_>) -> ElementHandle {
    let text = normalize_text(&element.text().collect::<String>());

    let href = element.value().attr("href").map(str::to_string).or_else(|| {
        // Cards often wrap the link one level down
        Selector::parse("a[href]").ok().and_then(|links| {
            element
                .select(&links)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(str::to_string)
        })
    });

    ElementHandle {
        html: element.html(),
        text,
        href,
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href against the page it appeared on
///
/// Returns None if the link cannot be followed:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
