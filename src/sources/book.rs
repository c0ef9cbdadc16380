//! Book-reader site adapter (anylang).
//!
//! The book index is rendered client side and lazy-loads as it is scrolled,
//! so the single list page is fetched through the rendering session with a
//! fixed number of scroll rounds. Book pages themselves are static.
//!
//! # URL Pattern
//!
//! Reader links look like `/en/books/<book-id>/read`; anything else on the
//! index is ignored. Each book is written to `<book-id>.txt`.

use crate::crawler::{FetchTarget, ScrollPolicy};
use crate::output::OutputUnit;
use crate::sources::parse::{selector, trimmed_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use scraper::Html;
use url::Url;

const INDEX_PATH: &str = "/en/books/en";
const INDEX_SCROLL_ROUNDS: u32 = 5;

pub struct BookReader {
    base_url: Url,
}

impl BookReader {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl SourceAdapter for BookReader {
    fn kind(&self) -> AdapterKind {
        AdapterKind::BookReader
    }

    fn list_target(&self, _unit: &Unit, page: u32) -> Option<FetchTarget> {
        if page != 1 {
            return None;
        }
        let url = self.base_url.join(INDEX_PATH).ok()?;
        Some(FetchTarget::rendered(
            url,
            ScrollPolicy::Fixed(INDEX_SCROLL_ROUNDS),
        ))
    }

    fn parse_list(&self, raw: &str, _page_url: &Url) -> Vec<ListItem> {
        let document = Html::parse_document(raw);
        let Some(field_selector) = selector(".field-content") else {
            return Vec::new();
        };
        let Some(link_selector) = selector("a[href]") else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for field in document.select(&field_selector) {
            let Some(link) = field.select(&link_selector).next() else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default();
            if !href.trim().trim_end_matches('/').ends_with("read") {
                continue;
            }
            items.push(ListItem::new(Some(trimmed_text(link)), href));
        }
        items
    }

    fn has_more(&self, _unit: &Unit, _page: u32, _items: &[ListItem]) -> bool {
        false
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        // Reader pages are split into <div class="page nN"> blocks
        let section_selector = selector("div[class*='page n']")?;
        let paragraph_selector = selector("p")?;
        document.select(&section_selector).next()?;

        let sections: Vec<String> = document
            .select(&section_selector)
            .map(|section| {
                section
                    .select(&paragraph_selector)
                    .map(trimmed_text)
                    .filter(|text| !text.is_empty())
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .collect();

        Some(ContentRecord::new(sections.join("\n")).with_title(link.title.clone()))
    }

    fn output_unit(&self, _unit: &Unit, link: &ContentLink, _record: &ContentRecord) -> OutputUnit {
        let segments: Vec<&str> = link
            .url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        // /en/books/<id>/read
        match segments.len() {
            n if n >= 2 => OutputUnit::new(segments[n - 2]),
            _ => OutputUnit::new("book"),
        }
    }

    fn needs_render(&self) -> bool {
        true
    }
}
