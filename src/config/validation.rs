use crate::config::types::{Config, CrawlerConfig, FetchConfig, RenderConfig, SourceEntry};
use crate::sources::{AdapterKind, UnitShape};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_render_config(&config.render)?;
    validate_sources(&config.sources)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.unit_concurrency < 1 || config.unit_concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "unit-concurrency must be between 1 and 64, got {}",
            config.unit_concurrency
        )));
    }

    validate_workers("crawler.workers", config.workers)
}

fn validate_workers(field: &str, workers: u32) -> Result<(), ConfigError> {
    if workers < 1 || workers > 64 {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 64, got {}",
            field, workers
        )));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fetch.user-agent cannot be empty".to_string(),
        ));
    }

    for name in config.headers.keys() {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "Invalid header name '{}'",
                name
            )));
        }
    }

    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.endpoint {
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid render endpoint: {}", e)))?;
        if !matches!(url.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "Render endpoint '{}' must use ws, wss, http or https",
                endpoint
            )));
        }
    }

    if config.max_scroll_rounds == 0 {
        return Err(ConfigError::Validation(
            "render.max-scroll-rounds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for source in sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }

        validate_source(source)?;
    }

    Ok(())
}

fn validate_source(source: &SourceEntry) -> Result<(), ConfigError> {
    let url = Url::parse(&source.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid base-url '{}' for source '{}': {}",
            source.base_url, source.name, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Source '{}' base-url must use http or https",
            source.name
        )));
    }

    if source.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' output-dir cannot be empty",
            source.name
        )));
    }

    if let Some(workers) = source.workers {
        validate_workers(&format!("source '{}' workers", source.name), workers)?;
    }

    if source.max_pages == Some(0) {
        return Err(ConfigError::Validation(format!(
            "Source '{}' max-pages must be >= 1",
            source.name
        )));
    }

    validate_units(source)
}

/// Checks the unit form matches what the adapter crawls by
fn validate_units(source: &SourceEntry) -> Result<(), ConfigError> {
    let has_units = source.units.as_ref().is_some_and(|u| !u.is_empty());
    let has_years = source.years.is_some();

    if has_units && has_years {
        return Err(ConfigError::Validation(format!(
            "Source '{}' cannot set both units and years",
            source.name
        )));
    }

    if let Some(years) = source.years {
        if years.start > years.end {
            return Err(ConfigError::Validation(format!(
                "Source '{}' year range {}..={} is empty",
                source.name, years.start, years.end
            )));
        }
    }

    let shape = source.adapter.unit_shape();
    let ok = match shape {
        UnitShape::Years => has_years,
        UnitShape::Named => has_units,
        UnitShape::Flat => !has_units && !has_years,
    };

    if !ok {
        return Err(ConfigError::Validation(format!(
            "Source '{}' uses adapter '{}' which requires {}",
            source.name,
            source.adapter,
            match shape {
                UnitShape::Years => "a `years` range",
                UnitShape::Named => "a non-empty `units` list",
                UnitShape::Flat => "neither `units` nor `years`",
            }
        )));
    }

    if source.adapter == AdapterKind::SouthernWeekly {
        if let Some(units) = &source.units {
            for unit in units {
                let id = unit.as_string();
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ConfigError::Validation(format!(
                        "Source '{}' term id '{}' must be numeric",
                        source.name, id
                    )));
                }
            }
        }
    }

    Ok(())
}
