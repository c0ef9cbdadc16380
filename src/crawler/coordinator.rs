//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives every unit of every source through its pagination
//! loop:
//! - Opening the unit's fetch backend and closing it when the unit ends
//! - Fetching list pages one at a time and handing them to the adapter
//! - Fanning each page's items out to a bounded worker pool and draining it
//!   before the next list page
//! - Running the units of a source concurrently up to a cap
//!
//! Item-level problems are logged and counted in the unit's report; nothing
//! here aborts a unit, a source or the run.

use crate::config::{Config, SourceEntry};
use crate::crawler::backend::{BackendProvider, DefaultProvider};
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::pool::WorkerPool;
use crate::output::{CrawlStatistics, RecordSink, Sink, SourceReport, UnitReport};
use crate::sources::{build_adapter, ContentLink, SourceAdapter, Unit};
use crate::state::{StopReason, UnitPhase};
use crate::{CorpusError, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A configured source, ready to crawl
pub struct CrawlSource {
    pub name: String,
    pub adapter: Arc<dyn SourceAdapter>,
    pub sink: Arc<dyn RecordSink>,
    pub units: Vec<Unit>,
    pub workers: usize,
    pub max_pages: Option<u32>,
    pub wait: Option<Duration>,
}

impl CrawlSource {
    /// Builds a source from its configuration entry
    ///
    /// # Arguments
    ///
    /// * `entry` - The `[[source]]` table
    /// * `default_workers` - Worker count when the entry sets none
    pub fn from_entry(entry: &SourceEntry, default_workers: u32) -> Result<Self> {
        let base_url = Url::parse(&entry.base_url)?;
        Ok(Self {
            name: entry.name.clone(),
            adapter: build_adapter(entry.adapter, base_url),
            sink: Arc::new(Sink::new(&entry.output_dir)),
            units: entry.resolve_units(),
            workers: entry.workers.unwrap_or(default_workers) as usize,
            max_pages: entry.max_pages,
            wait: entry.wait(),
        })
    }
}

/// What happened to one fanned-out item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Written,
    FetchFailed,
    ParseMiss,
    EmptyRecord,
    WriteFailed,
}

impl ItemOutcome {
    fn tally(self, report: &mut UnitReport) {
        match self {
            Self::Written => {
                report.content_fetched += 1;
                report.records_written += 1;
            }
            Self::FetchFailed => report.fetch_failures += 1,
            Self::ParseMiss => {
                report.content_fetched += 1;
                report.parse_misses += 1;
            }
            Self::EmptyRecord => {
                report.content_fetched += 1;
                report.empty_records += 1;
            }
            Self::WriteFailed => {
                report.content_fetched += 1;
                report.write_failures += 1;
            }
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    provider: Arc<dyn BackendProvider>,
    unit_concurrency: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `provider` - Opens one fetch backend per unit
    /// * `unit_concurrency` - Units of one source crawled at the same time
    pub fn new(provider: Arc<dyn BackendProvider>, unit_concurrency: usize) -> Self {
        Self {
            provider,
            unit_concurrency: unit_concurrency.max(1),
        }
    }

    /// Crawls every unit of a source, at most `unit_concurrency` at a time
    ///
    /// Reports come back in the order the units were configured.
    pub async fn run_source(&self, source: &CrawlSource) -> SourceReport {
        tracing::info!(
            "Source {} ({}): {} units, {} workers per unit",
            source.name,
            source.adapter.kind(),
            source.units.len(),
            source.workers
        );

        let mut reports: Vec<(usize, UnitReport)> = stream::iter(source.units.iter().enumerate())
            .map(|(index, unit)| async move { (index, self.run_unit(source, unit.clone()).await) })
            .buffer_unordered(self.unit_concurrency)
            .collect()
            .await;
        reports.sort_by_key(|(index, _)| *index);

        let report = SourceReport {
            name: source.name.clone(),
            adapter: source.adapter.kind(),
            units: reports.into_iter().map(|(_, report)| report).collect(),
        };
        tracing::info!(
            "Source {} finished: {} records written, {} failures",
            source.name,
            report.records_written(),
            report.failures()
        );
        report
    }

    /// Crawls one unit from its first list page until pagination stops
    ///
    /// The unit's backend is opened here and always closed here, whatever
    /// the outcome.
    pub async fn run_unit(&self, source: &CrawlSource, unit: Unit) -> UnitReport {
        let mut report = UnitReport::new(unit.to_string());
        tracing::info!("[{}] unit {} starting", source.name, unit);

        let backend = match self.provider.open(source.adapter.needs_render()).await {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!("[{}] unit {}: backend unavailable: {}", source.name, unit, e);
                report.stop_reason = Some(StopReason::BackendUnavailable);
                return report;
            }
        };

        let outcome = self.paginate(source, &unit, &backend, &mut report).await;
        backend.close().await;

        match outcome {
            Ok(stop) => report.stop_reason = Some(stop),
            Err(e) => tracing::error!("[{}] unit {} aborted: {}", source.name, unit, e),
        }

        tracing::info!(
            "[{}] unit {} done after {} list pages: {} written, {} failed, stop: {}",
            source.name,
            unit,
            report.list_pages,
            report.records_written,
            report.failures(),
            report
                .stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "error".to_string())
        );
        report
    }

    async fn paginate(
        &self,
        source: &CrawlSource,
        unit: &Unit,
        backend: &Arc<dyn Fetcher>,
        report: &mut UnitReport,
    ) -> Result<StopReason> {
        let adapter = &source.adapter;
        let mut phase = UnitPhase::Start;
        let mut pool = WorkerPool::new(source.workers);
        let mut page: u32 = 1;

        loop {
            if source.max_pages.is_some_and(|cap| page > cap) {
                tracing::info!("[{}] unit {}: page cap reached", source.name, unit);
                advance(&mut phase, UnitPhase::Done)?;
                return Ok(StopReason::PageCap);
            }

            let Some(target) = adapter.list_target(unit, page) else {
                advance(&mut phase, UnitPhase::Done)?;
                return Ok(StopReason::Exhausted);
            };

            advance(&mut phase, UnitPhase::ListFetch)?;
            throttle(source.wait).await;
            tracing::debug!("[{}] unit {} page {}: {}", source.name, unit, page, target.url);

            let items = match backend.fetch(&target).await.into_body() {
                Some(raw) => {
                    report.list_pages += 1;
                    advance(&mut phase, UnitPhase::ParseList)?;
                    adapter.parse_list(&raw, &target.url)
                }
                None if adapter.skip_failed_list() => {
                    tracing::warn!(
                        "[{}] unit {}: list page {} unavailable, skipping",
                        source.name,
                        unit,
                        page
                    );
                    advance(&mut phase, UnitPhase::ParseList)?;
                    Vec::new()
                }
                None => {
                    tracing::warn!(
                        "[{}] unit {}: list page {} yielded nothing, ending unit",
                        source.name,
                        unit,
                        page
                    );
                    advance(&mut phase, UnitPhase::Done)?;
                    return Ok(StopReason::EmptyListFetch);
                }
            };
            report.items_discovered += items.len() as u64;
            tracing::debug!(
                "[{}] unit {} page {}: {} items",
                source.name,
                unit,
                page,
                items.len()
            );

            // Date archives keep paging past an empty day; everything else
            // stops on the first empty page
            let more = adapter.has_more(unit, page, &items);
            if items.is_empty() && !more {
                advance(&mut phase, UnitPhase::Done)?;
                return Ok(StopReason::Exhausted);
            }

            advance(&mut phase, UnitPhase::FanOutContent)?;
            for item in &items {
                let Some(link) = item.resolve(&target.url) else {
                    tracing::debug!("[{}] discarding item with link {:?}", source.name, item.href);
                    report.items_discarded += 1;
                    continue;
                };
                pool.spawn(fetch_content(
                    adapter.clone(),
                    backend.clone(),
                    source.sink.clone(),
                    unit.clone(),
                    link,
                    source.wait,
                ));
            }
            tracing::debug!(
                "[{}] unit {} page {}: fetching {} items",
                source.name,
                unit,
                page,
                pool.pending()
            );
            for outcome in pool.drain().await {
                outcome.tally(report);
            }

            if !more {
                advance(&mut phase, UnitPhase::Done)?;
                return Ok(StopReason::Exhausted);
            }
            page += 1;
        }
    }
}

/// Fetches, extracts and persists one item
async fn fetch_content(
    adapter: Arc<dyn SourceAdapter>,
    backend: Arc<dyn Fetcher>,
    sink: Arc<dyn RecordSink>,
    unit: Unit,
    link: ContentLink,
    wait: Option<Duration>,
) -> ItemOutcome {
    throttle(wait).await;

    let target = adapter.content_target(link.url.clone());
    let Some(raw) = backend.fetch(&target).await.into_body() else {
        return ItemOutcome::FetchFailed;
    };

    let Some(record) = adapter.parse_content(&raw, &link) else {
        tracing::warn!("No content container at {}", link.url);
        return ItemOutcome::ParseMiss;
    };
    if record.is_empty() {
        tracing::debug!("Empty content at {}", link.url);
        return ItemOutcome::EmptyRecord;
    }

    let output = adapter.output_unit(&unit, &link, &record);
    match sink.append(&output, &record).await {
        Ok(()) => {
            tracing::debug!("Saved {} to {}", link.url, output);
            ItemOutcome::Written
        }
        Err(e) => {
            tracing::error!("Failed to save {} to {}: {}", link.url, output, e);
            ItemOutcome::WriteFailed
        }
    }
}

fn advance(phase: &mut UnitPhase, next: UnitPhase) -> Result<()> {
    if !phase.can_transition_to(next) {
        return Err(CorpusError::InvalidTransition {
            from: *phase,
            to: next,
        });
    }
    *phase = next;
    Ok(())
}

async fn throttle(wait: Option<Duration>) {
    if let Some(wait) = wait {
        tokio::time::sleep(wait).await;
    }
}

/// Runs the configured sources one after another
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `only` - Source names to crawl; empty means all
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Per-source, per-unit counters
/// * `Err(CorpusError)` - The HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use corpus_ripple::config::load_config;
/// use corpus_ripple::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let stats = run_crawl(&config, &[]).await?;
/// println!("{} records written", stats.total_records_written());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, only: &[String]) -> Result<CrawlStatistics> {
    let client = build_http_client(&config.fetch)?;
    let provider = Arc::new(DefaultProvider::new(
        client,
        config.fetch.clone(),
        config.render.clone(),
    ));
    run_crawl_with(config, only, provider).await
}

/// Same as [`run_crawl`] with a caller-supplied backend provider
pub async fn run_crawl_with(
    config: &Config,
    only: &[String],
    provider: Arc<dyn BackendProvider>,
) -> Result<CrawlStatistics> {
    for name in only {
        if !config.sources.iter().any(|s| &s.name == name) {
            tracing::warn!("No source named {} in configuration", name);
        }
    }

    let coordinator = Coordinator::new(provider, config.crawler.unit_concurrency as usize);
    let mut stats = CrawlStatistics::default();

    for entry in config
        .sources
        .iter()
        .filter(|s| only.is_empty() || only.contains(&s.name))
    {
        let source = match CrawlSource::from_entry(entry, config.crawler.workers) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Skipping source {}: {}", entry.name, e);
                continue;
            }
        };
        stats.sources.push(coordinator.run_source(&source).await);
    }

    Ok(stats)
}
