//! Site-Harvest: a resumable breadth-first site crawler
//!
//! This crate crawls a website from a seed URL, splits every page's links into
//! ones worth following and ones merely worth recording, turns each page into
//! titled content blocks, and hands the result to an external classifier for
//! structuring and synthesis.

pub mod config;
pub mod crawler;
pub mod dom;
pub mod enrich;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Render error: {0}")]
    Render(#[from] crawler::RenderError),

    #[error("Classifier error: {0}")]
    Classify(#[from] enrich::ClassifyError),

    #[error("State error: {0}")]
    State(#[from] state::StateError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::PageState,
        to: state::PageState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in job file: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingSecret(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Site-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlJob};
pub use crawler::{CrawlOutcome, Orchestrator, PageRecord};
pub use enrich::{CrawlResult, EnrichedPageRecord};
pub use state::{CrawlState, PageState, StateStore};
pub use url::{normalize_url, url_to_slug, LinkFilter, ScopeFilter};
