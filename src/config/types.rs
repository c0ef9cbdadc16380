use crate::sources::{AdapterKind, Unit};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Corpus-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of units of one source crawled at the same time
    #[serde(rename = "unit-concurrency", default = "default_unit_concurrency")]
    pub unit_concurrency: u32,

    /// Default number of concurrent content fetches per unit
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            unit_concurrency: default_unit_concurrency(),
            workers: default_workers(),
        }
    }
}

fn default_unit_concurrency() -> u32 {
    4
}

fn default_workers() -> u32 {
    5
}

/// Stateless HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Extra default headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            headers: HashMap::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string()
}

/// Whether the browser window is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    #[default]
    Headless,
    Headed,
}

/// Rendered (headless browser) fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(rename = "render-mode", default)]
    pub render_mode: RenderMode,

    /// Remote DevTools websocket; when set the session connects instead of launching
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Wait after each navigation before reading the document (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait after each scroll (milliseconds)
    #[serde(rename = "scroll-wait-ms", default = "default_scroll_wait_ms")]
    pub scroll_wait_ms: u64,

    /// Upper bound on scroll-until-stable rounds
    #[serde(rename = "max-scroll-rounds", default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,

    /// Browser executable to launch instead of the detected one
    #[serde(default)]
    pub executable: Option<PathBuf>,
}

impl RenderConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::default(),
            endpoint: None,
            settle_ms: default_settle_ms(),
            scroll_wait_ms: default_scroll_wait_ms(),
            max_scroll_rounds: default_max_scroll_rounds(),
            executable: None,
        }
    }
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_scroll_wait_ms() -> u64 {
    5000
}

fn default_max_scroll_rounds() -> u32 {
    40
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown run summary, written when set
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Inclusive year range for date-archive sources
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

/// Unit identifiers may be written as strings or bare numbers (term ids)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UnitId {
    Text(String),
    Number(i64),
}

impl UnitId {
    pub fn as_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One crawl target
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Unique source name, used in logs and the run summary
    pub name: String,

    /// Which site adapter parses this source
    pub adapter: AdapterKind,

    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Directory the source's text files are written to
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Explicit units (term ids, column names)
    #[serde(default)]
    pub units: Option<Vec<UnitId>>,

    /// Year range for date-archive sources
    #[serde(default)]
    pub years: Option<YearRange>,

    /// Content workers per unit; falls back to `crawler.workers`
    #[serde(default)]
    pub workers: Option<u32>,

    /// Stop a unit after this many list pages
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Pause before each request (milliseconds)
    #[serde(rename = "wait-ms", default)]
    pub wait_ms: Option<u64>,
}

impl SourceEntry {
    /// Enumerates the units this source is crawled by
    pub fn resolve_units(&self) -> Vec<Unit> {
        if let Some(years) = self.years {
            return (years.start..=years.end).map(Unit::Year).collect();
        }
        match &self.units {
            Some(units) if !units.is_empty() => units
                .iter()
                .map(|u| Unit::Named(u.as_string()))
                .collect(),
            _ => vec![Unit::All],
        }
    }

    pub fn wait(&self) -> Option<Duration> {
        self.wait_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}
