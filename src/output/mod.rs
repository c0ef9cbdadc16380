//! Output module for persisting records and reporting on a crawl
//!
//! This module handles:
//! - Naming output files and appending records to them safely
//! - Collecting per-unit crawl statistics
//! - Generating markdown summaries of crawl results

mod markdown;
mod sink;
pub mod stats;
mod traits;
mod unit;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sink::{format_record, Sink};
pub use stats::{print_statistics, CrawlStatistics, SourceReport, UnitReport};
pub use traits::{CrawlSummary, OutputError, OutputResult, RecordSink};
pub use unit::OutputUnit;
