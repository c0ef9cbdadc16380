//! Site adapters for every crawled source
//!
//! Each site is a variant implementing the same [`SourceAdapter`] capability
//! set: build a list-page target for a unit and page, extract list items, decide
//! whether pagination continues, and extract article content. Adapters are pure
//! transformations; all network work happens in the fetch backend.
//!
//! | Kind | Module | Site shape | Units |
//! |------|--------|------------|-------|
//! | `book-reader` | [`book`] | rendered book index, static book pages | `all` |
//! | `china-daily` | [`china_daily`] | dated daily archive | years |
//! | `global-times` | [`global_times`] | rendered column lists | columns |
//! | `southern-weekly` | [`southern_weekly`] | JSON list API | term ids |
//! | `sina` | [`sina`] | single list page | `all` |
//! | `the-paper` | [`the_paper`] | infinite-scroll homepage | `all` |

pub mod book;
pub mod china_daily;
pub mod global_times;
mod parse;
pub mod sina;
pub mod southern_weekly;
pub mod the_paper;

pub use parse::resolve_link;

use crate::crawler::FetchTarget;
use crate::output::OutputUnit;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// An enumerable crawl subdivision processed independently
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Flat sources with a single list
    All,
    /// A calendar year of a date archive
    Year(i32),
    /// A term id or column name
    Named(String),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Year(year) => write!(f, "{}", year),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A (title, link) pair discovered on a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub title: Option<String>,
    /// Raw link as found on the page; may be relative or empty
    pub href: String,
}

impl ListItem {
    pub fn new(title: Option<String>, href: impl Into<String>) -> Self {
        Self {
            title: title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            href: href.into(),
        }
    }

    /// Resolves this item against the list page it came from
    ///
    /// Returns None for empty or unusable links; such items are never fetched.
    pub fn resolve(&self, page_url: &Url) -> Option<ContentLink> {
        let url = resolve_link(&self.href, page_url)?;
        Some(ContentLink {
            title: self.title.clone(),
            url,
        })
    }
}

/// A list item whose link resolved to an absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLink {
    pub title: Option<String>,
    pub url: Url,
}

/// Extracted article text plus whatever metadata the page exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRecord {
    pub title: Option<String>,
    pub body: String,
    pub published: Option<String>,
    pub byline: Option<String>,
    pub url: Option<String>,
}

impl ContentRecord {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Records with a blank body are never persisted
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// How a source's units are enumerated in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitShape {
    Years,
    Named,
    Flat,
}

/// Which site adapter a source uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    BookReader,
    ChinaDaily,
    GlobalTimes,
    SouthernWeekly,
    Sina,
    ThePaper,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookReader => "book-reader",
            Self::ChinaDaily => "china-daily",
            Self::GlobalTimes => "global-times",
            Self::SouthernWeekly => "southern-weekly",
            Self::Sina => "sina",
            Self::ThePaper => "the-paper",
        }
    }

    pub fn unit_shape(&self) -> UnitShape {
        match self {
            Self::ChinaDaily => UnitShape::Years,
            Self::GlobalTimes | Self::SouthernWeekly => UnitShape::Named,
            Self::BookReader | Self::Sina | Self::ThePaper => UnitShape::Flat,
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The per-site capability set driven by the coordinator
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Builds the list page target for a unit and 1-based page number
    ///
    /// Returns None when the unit has no such page (e.g. a day past the end
    /// of the year).
    fn list_target(&self, unit: &Unit, page: u32) -> Option<FetchTarget>;

    /// Extracts list items in document order
    ///
    /// A missing list block yields an empty vec, never an error.
    fn parse_list(&self, raw: &str, page_url: &Url) -> Vec<ListItem>;

    /// Decides whether pagination continues after `page`
    ///
    /// An empty page is the only end-of-list signal these sites give.
    fn has_more(&self, _unit: &Unit, _page: u32, items: &[ListItem]) -> bool {
        !items.is_empty()
    }

    /// True if a list page that fails to load counts as an empty page
    ///
    /// Otherwise a failed list fetch ends the unit.
    fn skip_failed_list(&self) -> bool {
        false
    }

    /// Builds the fetch target for one article
    fn content_target(&self, url: Url) -> FetchTarget {
        FetchTarget::http(url)
    }

    /// Extracts the article; None when the content container is absent
    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord>;

    /// Names the file a record is appended to
    fn output_unit(&self, unit: &Unit, link: &ContentLink, record: &ContentRecord)
        -> OutputUnit;

    /// True if any target this adapter builds needs a rendering session
    fn needs_render(&self) -> bool {
        false
    }
}

/// Builds the adapter for a configured source
pub fn build_adapter(kind: AdapterKind, base_url: Url) -> Arc<dyn SourceAdapter> {
    match kind {
        AdapterKind::BookReader => Arc::new(book::BookReader::new(base_url)),
        AdapterKind::ChinaDaily => Arc::new(china_daily::ChinaDaily::new(base_url)),
        AdapterKind::GlobalTimes => Arc::new(global_times::GlobalTimes::new(base_url)),
        AdapterKind::SouthernWeekly => Arc::new(southern_weekly::SouthernWeekly::new(base_url)),
        AdapterKind::Sina => Arc::new(sina::Sina::new(base_url)),
        AdapterKind::ThePaper => Arc::new(the_paper::ThePaper::new(base_url)),
    }
}
