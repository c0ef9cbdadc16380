//! Shared HTML helpers for the site adapters
//!
//! Selector compilation, text extraction and link resolution used by every
//! adapter. None of these fail: a bad selector or an unusable link yields
//! nothing, which the adapters turn into an empty result.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiles a CSS selector, None if it is invalid
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

/// Returns the first element matching `css`
pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

/// Returns the first descendant of `element` matching `css`
pub(crate) fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    element.select(&selector).next()
}

/// All descendant text of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Descendant text of an element with surrounding whitespace removed
pub(crate) fn trimmed_text(element: ElementRef<'_>) -> String {
    element_text(element).trim().to_string()
}

/// Non-blank text runs of an element, one per line
///
/// Approximates how a browser lays out block text: every text node is its
/// own line, whitespace-only nodes are dropped.
pub(crate) fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty or whitespace-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
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
