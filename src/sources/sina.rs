//! Sina society news adapter.
//!
//! One static list page; every article goes to its own file named after the
//! cleaned headline, with the publication date, outlet and URL kept as
//! metadata lines.

use crate::crawler::FetchTarget;
use crate::output::OutputUnit;
use crate::sources::parse::{select_first, select_within, selector, trimmed_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use regex::Regex;
use scraper::Html;
use url::Url;

const MAX_TITLE_CHARS: usize = 50;

pub struct Sina {
    base_url: Url,
    title_noise: Option<Regex>,
}

impl Sina {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            title_noise: Regex::new(r#"[\s+.!/_,$%^*(+"']+|[+<>?、~*（）]+"#).ok(),
        }
    }

    /// Strips punctuation runs from a headline and swaps ':' for its full-width form
    pub fn clean_title(&self, title: &str) -> String {
        let stripped = match &self.title_noise {
            Some(pattern) => pattern.replace_all(title, "").into_owned(),
            None => title.to_string(),
        };
        stripped.replace(':', "：")
    }
}

impl SourceAdapter for Sina {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Sina
    }

    fn list_target(&self, _unit: &Unit, page: u32) -> Option<FetchTarget> {
        (page == 1).then(|| FetchTarget::http(self.base_url.clone()))
    }

    fn parse_list(&self, raw: &str, _page_url: &Url) -> Vec<ListItem> {
        let document = Html::parse_document(raw);
        let Some(item_selector) = selector("ul.seo_data_list li") else {
            return Vec::new();
        };

        document
            .select(&item_selector)
            .filter_map(|li| select_within(li, "a"))
            .map(|link| {
                let href = link.value().attr("href").unwrap_or_default();
                ListItem::new(Some(trimmed_text(link)), href)
            })
            .collect()
    }

    fn has_more(&self, _unit: &Unit, _page: u32, _items: &[ListItem]) -> bool {
        false
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        let article = select_first(&document, "div.article")?;

        let date_source = select_first(&document, "div.date-source");
        let published = date_source
            .and_then(|ds| select_within(ds, "span"))
            .map(trimmed_text)
            .filter(|s| !s.is_empty());
        let byline = date_source
            .and_then(|ds| select_within(ds, "a"))
            .map(trimmed_text)
            .filter(|s| !s.is_empty());

        let title = link.title.as_deref().map(|t| self.clean_title(t));

        let mut record = ContentRecord::new(trimmed_text(article)).with_title(title);
        record.published = published;
        record.byline = byline;
        record.url = Some(link.url.to_string());
        Some(record)
    }

    fn output_unit(&self, _unit: &Unit, link: &ContentLink, record: &ContentRecord) -> OutputUnit {
        match &record.title {
            Some(title) => OutputUnit::slug(title, MAX_TITLE_CHARS),
            None => OutputUnit::slug(
                link.url
                    .path_segments()
                    .and_then(|s| s.filter(|seg| !seg.is_empty()).last())
                    .unwrap_or("article"),
                MAX_TITLE_CHARS,
            ),
        }
    }
}
