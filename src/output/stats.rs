//! Crawl statistics
//!
//! Per-unit counters collected by the coordinator, rolled up per source and
//! per run, and the console printout shown when a crawl finishes.

use crate::sources::AdapterKind;
use crate::state::StopReason;

/// Counters for one unit of one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitReport {
    /// Unit label (`all`, a year, a term id or a column)
    pub unit: String,

    /// List pages fetched successfully
    pub list_pages: u64,

    /// List items extracted across all pages
    pub items_discovered: u64,

    /// Items dropped before fetch (empty or unresolvable link)
    pub items_discarded: u64,

    /// Content pages fetched successfully
    pub content_fetched: u64,

    /// Content fetches that failed
    pub fetch_failures: u64,

    /// Content pages without the expected container
    pub parse_misses: u64,

    /// Extracted records with an empty body
    pub empty_records: u64,

    /// Records appended to disk
    pub records_written: u64,

    /// Records lost to a write error
    pub write_failures: u64,

    /// Why pagination ended
    pub stop_reason: Option<StopReason>,
}

impl UnitReport {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    /// Item-level failures of any kind
    pub fn failures(&self) -> u64 {
        self.fetch_failures + self.parse_misses + self.write_failures
    }
}

/// All unit reports of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub adapter: AdapterKind,
    pub units: Vec<UnitReport>,
}

impl SourceReport {
    pub fn records_written(&self) -> u64 {
        self.units.iter().map(|u| u.records_written).sum()
    }

    pub fn content_fetched(&self) -> u64 {
        self.units.iter().map(|u| u.content_fetched).sum()
    }

    pub fn failures(&self) -> u64 {
        self.units.iter().map(UnitReport::failures).sum()
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    pub sources: Vec<SourceReport>,
}

impl CrawlStatistics {
    pub fn total_units(&self) -> usize {
        self.sources.iter().map(|s| s.units.len()).sum()
    }

    pub fn total_list_pages(&self) -> u64 {
        self.units().map(|u| u.list_pages).sum()
    }

    pub fn total_items_discovered(&self) -> u64 {
        self.units().map(|u| u.items_discovered).sum()
    }

    pub fn total_content_fetched(&self) -> u64 {
        self.units().map(|u| u.content_fetched).sum()
    }

    pub fn total_fetch_failures(&self) -> u64 {
        self.units().map(|u| u.fetch_failures).sum()
    }

    pub fn total_records_written(&self) -> u64 {
        self.units().map(|u| u.records_written).sum()
    }

    fn units(&self) -> impl Iterator<Item = &UnitReport> {
        self.sources.iter().flat_map(|s| s.units.iter())
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Sources: {}", stats.sources.len());
    println!("  Units: {}", stats.total_units());
    println!("  List pages fetched: {}", stats.total_list_pages());
    println!("  Items discovered: {}", stats.total_items_discovered());
    println!("  Content pages fetched: {}", stats.total_content_fetched());
    println!("  Records written: {}", stats.total_records_written());
    println!();

    for source in &stats.sources {
        println!(
            "{} ({}): {} records, {} failures",
            source.name,
            source.adapter,
            source.records_written(),
            source.failures()
        );

        for unit in &source.units {
            let stop = unit
                .stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<16} pages {:>4}  items {:>5}  written {:>5}  failed {:>4}  stop: {}",
                unit.unit,
                unit.list_pages,
                unit.items_discovered,
                unit.records_written,
                unit.failures(),
                stop
            );
        }
        println!();
    }

    let fetched = stats.total_content_fetched();
    let written = stats.total_records_written();
    let success_rate = if fetched > 0 {
        (written as f64 / fetched as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} fetched pages written)",
        success_rate, written, fetched
    );
}
