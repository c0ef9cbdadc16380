//! Output traits and types
//!
//! This module defines the record sink interface the coordinator writes
//! through, the output error type, and the run summary handed to reporters.

use crate::output::stats::CrawlStatistics;
use crate::output::OutputUnit;
use crate::sources::ContentRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to persist a record with an empty body")]
    EmptyRecord,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted records
///
/// Implementations must tolerate concurrent `append` calls from every worker
/// of every unit of a source, and must never interleave two records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Appends one record to the file named by `unit`
    ///
    /// # Arguments
    ///
    /// * `unit` - The output file the record belongs to
    /// * `record` - The extracted record; an empty body is rejected
    async fn append(&self, unit: &OutputUnit, record: &ContentRecord) -> OutputResult<()>;
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub config_hash: String,

    pub statistics: CrawlStatistics,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of fetched content pages that ended up written, as a percentage
    pub fn success_rate(&self) -> f64 {
        let fetched = self.statistics.total_content_fetched();
        if fetched == 0 {
            return 0.0;
        }
        (self.statistics.total_records_written() as f64 / fetched as f64) * 100.0
    }

    /// Share of attempted content fetches that failed, as a percentage
    pub fn error_rate(&self) -> f64 {
        let failures = self.statistics.total_fetch_failures();
        let attempted = self.statistics.total_content_fetched() + failures;
        if attempted == 0 {
            return 0.0;
        }
        (failures as f64 / attempted as f64) * 100.0
    }
}
