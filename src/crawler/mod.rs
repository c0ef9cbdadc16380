//! Crawler module for fetching and processing sources
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and rendered (headless browser) fetching
//! - Per-unit backends and the bounded content worker pool
//! - Pagination and overall crawl coordination

mod backend;
mod coordinator;
mod fetcher;
mod pool;
mod render;

pub use backend::{BackendProvider, DefaultProvider, UnitBackend};
pub use coordinator::{run_crawl, run_crawl_with, Coordinator, CrawlSource};
pub use fetcher::{
    build_http_client, decode_body, FetchMode, FetchResult, FetchTarget, Fetcher, HttpFetcher,
    ScrollPolicy,
};
pub use pool::WorkerPool;
pub use render::RenderSession;

use crate::config::Config;
use crate::output::{generate_markdown_summary, CrawlSummary};
use crate::Result;
use chrono::Utc;
use std::path::Path;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the shared HTTP client
/// 2. Crawl the selected sources, each unit with its own backend
/// 3. Write the markdown summary if `output.summary-path` is set
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded in the summary
/// * `only` - Source names to crawl; empty means all
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished; item failures are in the statistics
/// * `Err(CorpusError)` - Crawl could not start
pub async fn crawl(config: &Config, config_hash: &str, only: &[String]) -> Result<CrawlSummary> {
    let started = Utc::now();
    let statistics = run_crawl(config, only).await?;
    let finished = Utc::now();

    let summary = CrawlSummary {
        started_at: started.to_rfc3339(),
        finished_at: Some(finished.to_rfc3339()),
        duration_seconds: u64::try_from((finished - started).num_seconds()).ok(),
        config_hash: config_hash.to_string(),
        statistics,
    };

    if let Some(path) = &config.output.summary_path {
        match generate_markdown_summary(&summary, Path::new(path)) {
            Ok(()) => tracing::info!("Summary written to {}", path),
            Err(e) => tracing::error!("Failed to write summary to {}: {}", path, e),
        }
    }

    Ok(summary)
}
