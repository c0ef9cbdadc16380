//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl run,
//! with per-source and per-unit counters.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary of a crawl run
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# Corpus-Ripple Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Sources**: {}\n", stats.sources.len()));
    md.push_str(&format!("- **Units**: {}\n", stats.total_units()));
    md.push_str(&format!("- **List Pages**: {}\n", stats.total_list_pages()));
    md.push_str(&format!(
        "- **Items Discovered**: {}\n",
        stats.total_items_discovered()
    ));
    md.push_str(&format!(
        "- **Content Pages Fetched**: {}\n",
        stats.total_content_fetched()
    ));
    md.push_str(&format!(
        "- **Records Written**: {}\n",
        stats.total_records_written()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Error Rate**: {:.2}%\n\n",
        summary.error_rate()
    ));

    // Per-source breakdown
    for source in &stats.sources {
        md.push_str(&format!("## {} (`{}`)\n\n", source.name, source.adapter));
        if source.units.is_empty() {
            md.push_str("No units were crawled.\n\n");
            continue;
        }

        md.push_str("| Unit | List Pages | Items | Discarded | Fetched | Fetch Failed | Parse Miss | Empty | Written | Write Failed | Stop |\n");
        md.push_str("|------|------------|-------|-----------|---------|--------------|------------|-------|---------|--------------|------|\n");
        for unit in &source.units {
            let stop = unit
                .stop_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                unit.unit,
                unit.list_pages,
                unit.items_discovered,
                unit.items_discarded,
                unit.content_fetched,
                unit.fetch_failures,
                unit.parse_misses,
                unit.empty_records,
                unit.records_written,
                unit.write_failures,
                stop
            ));
        }
        md.push('\n');
    }

    md
}
