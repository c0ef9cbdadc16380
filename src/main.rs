//! Corpus-Ripple main entry point
//!
//! This is the command-line interface for the Corpus-Ripple corpus crawler.

use clap::Parser;
use corpus_ripple::config::{load_config_with_hash, Config, SourceEntry};
use corpus_ripple::crawler::crawl;
use corpus_ripple::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Corpus-Ripple: a multi-source text corpus crawler
///
/// Corpus-Ripple crawls the news and literature sources listed in its
/// configuration, extracts article text with a per-site adapter and appends
/// it to plain text files for corpus analysis.
#[derive(Parser, Debug)]
#[command(name = "corpus-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A multi-source text corpus crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Only crawl the named source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.sources);
    } else {
        handle_crawl(&config, &config_hash, &cli.sources, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_ripple=info,warn"),
            1 => EnvFilter::new("corpus_ripple=debug,info"),
            2 => EnvFilter::new("corpus_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Sources picked by `--source`, or all of them
fn selected<'a>(config: &'a Config, only: &'a [String]) -> impl Iterator<Item = &'a SourceEntry> {
    config
        .sources
        .iter()
        .filter(move |s| only.is_empty() || only.contains(&s.name))
}

/// Handles the --dry-run mode: shows the resolved sources and units
fn handle_dry_run(config: &Config, only: &[String]) {
    println!("=== Corpus-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Unit concurrency: {}", config.crawler.unit_concurrency);
    println!("  Default workers per unit: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.fetch.timeout_secs);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nRendering:");
    println!("  Mode: {:?}", config.render.render_mode);
    match &config.render.endpoint {
        Some(endpoint) => println!("  Endpoint: {}", endpoint),
        None => println!("  Endpoint: (launch local browser)"),
    }
    println!("  Settle: {}ms", config.render.settle_ms);
    println!("  Scroll wait: {}ms", config.render.scroll_wait_ms);

    if let Some(path) = &config.output.summary_path {
        println!("\nSummary: {}", path);
    }

    let mut unit_count = 0;
    println!();
    for source in selected(config, only) {
        let units = source.resolve_units();
        unit_count += units.len();
        println!("Source {} ({}):", source.name, source.adapter);
        println!("  Base URL: {}", source.base_url);
        println!("  Output: {}", source.output_dir);
        println!(
            "  Workers: {}",
            source.workers.unwrap_or(config.crawler.workers)
        );
        if let Some(max_pages) = source.max_pages {
            println!("  Max pages per unit: {}", max_pages);
        }
        let labels: Vec<String> = units.iter().map(|u| u.to_string()).collect();
        println!("  Units ({}): {}", units.len(), labels.join(", "));
        println!();
    }

    println!("✓ Configuration is valid");
    println!("✓ Would crawl {} units", unit_count);
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    only: &[String],
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_count = selected(config, only).count();
    tracing::info!("Starting crawl of {} sources", source_count);

    match crawl(config, config_hash, only).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} records written",
                summary.statistics.total_records_written()
            );
            if !quiet {
                println!();
                print_statistics(&summary.statistics);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
