//! China Daily dated archive adapter.
//!
//! The archive has one index page per day at
//! `{base}YYYY-MM/DD/index1.html`. A year unit is walked day by day: page N
//! is the N-th day of the year, and pagination ends when the year runs out
//! rather than when a day happens to list no articles.

use crate::crawler::FetchTarget;
use crate::output::OutputUnit;
use crate::sources::parse::{select_first, trimmed_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

pub struct ChinaDaily {
    base_url: Url,
    article_link: Option<Regex>,
}

impl ChinaDaily {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            article_link: Regex::new(r#"content_[^"'<>\s]*?\.htm"#).ok(),
        }
    }

    /// The archive date page `page` of `year` stands for
    pub fn day_of(year: i32, page: u32) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let date = first.checked_add_days(Days::new(u64::from(page.checked_sub(1)?)))?;
        (date.year() == year).then_some(date)
    }
}

impl SourceAdapter for ChinaDaily {
    fn kind(&self) -> AdapterKind {
        AdapterKind::ChinaDaily
    }

    fn list_target(&self, unit: &Unit, page: u32) -> Option<FetchTarget> {
        let Unit::Year(year) = unit else {
            return None;
        };
        let date = Self::day_of(*year, page)?;
        let path = format!("{}index1.html", date.format("%Y-%m/%d/"));
        let url = self.base_url.join(&path).ok()?;
        Some(FetchTarget::http(url))
    }

    fn parse_list(&self, raw: &str, _page_url: &Url) -> Vec<ListItem> {
        let Some(pattern) = &self.article_link else {
            return Vec::new();
        };

        // Article links appear more than once per index (headline and thumbnail)
        let mut seen = HashSet::new();
        pattern
            .find_iter(raw)
            .map(|m| m.as_str())
            .filter(|link| seen.insert(*link))
            .map(|link| ListItem::new(None, link))
            .collect()
    }

    fn has_more(&self, unit: &Unit, page: u32, _items: &[ListItem]) -> bool {
        match unit {
            Unit::Year(year) => Self::day_of(*year, page + 1).is_some(),
            _ => false,
        }
    }

    // Days without an issue have no index page
    fn skip_failed_list(&self) -> bool {
        true
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        let content = select_first(&document, "#Content")?;
        let title = select_first(&document, ".lft_art > h1")
            .map(trimmed_text)
            .or_else(|| link.title.clone());

        Some(ContentRecord::new(trimmed_text(content)).with_title(title))
    }

    fn output_unit(&self, unit: &Unit, _link: &ContentLink, _record: &ContentRecord) -> OutputUnit {
        OutputUnit::new(&unit.to_string())
    }
}
