//! Corpus-Ripple: a multi-source text corpus crawler
//!
//! This crate crawls a fixed set of news and literature sites, extracts article
//! text with one adapter per site, and appends the cleaned text to plain UTF-8
//! files for downstream linguistic analysis.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sources;
pub mod state;

use thiserror::Error;

/// Main error type for Corpus-Ripple operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid request header: {0}")]
    Header(String),

    #[error("Render session error: {0}")]
    Render(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::UnitPhase,
        to: state::UnitPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Corpus-Ripple operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use sources::{AdapterKind, ContentRecord, ListItem, SourceAdapter, Unit};
pub use state::UnitPhase;
