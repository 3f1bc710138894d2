//! Configuration module for Site-Harvest
//!
//! This module handles loading, parsing, and validating TOML job files.
//!
//! # Example
//!
//! ```no_run
//! use site_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("jobs/work-visas.toml")).unwrap();
//! println!("Crawling {} to depth {}", config.job.start_url, config.job.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlJob, CrawlerConfig, EnrichmentConfig, OutputConfig, Provider,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_api_key,
};
pub use validation::{validate, validate_job, MAX_DEPTH_LIMIT, MAX_PAGES_LIMIT};
