use crate::config::types::{
    ClassifierConfig, Config, CrawlJob, CrawlerConfig, EnrichmentConfig, OutputConfig, Provider,
};
use crate::url::normalize_url;
use crate::ConfigError;
use scraper::Selector;

/// Deepest crawl a job may request
pub const MAX_DEPTH_LIMIT: u32 = 5;

/// Most pages a job may request
pub const MAX_PAGES_LIMIT: usize = 500;

/// Validates the entire job file
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_job(&config.job)?;
    validate_crawler_config(&config.crawler)?;
    validate_enrichment_config(&config.enrichment)?;
    validate_classifier_config(&config.classifier)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl job definition
pub fn validate_job(job: &CrawlJob) -> Result<(), ConfigError> {
    if job.job_name.trim().is_empty() {
        return Err(ConfigError::Validation("job-name cannot be empty".to_string()));
    }

    normalize_url(&job.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start-url '{}': {}", job.start_url, e))
    })?;

    if job.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-depth must be between 0 and {}, got {}",
            MAX_DEPTH_LIMIT, job.max_depth
        )));
    }

    if job.max_pages < 1 || job.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, job.max_pages
        )));
    }

    if let Some(selector) = &job.content_area_selector {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::Validation(format!(
                "content-area-selector is not a valid CSS selector: '{}'",
                selector
            )));
        }
    }

    Ok(())
}

/// Validates crawl pacing and retry settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.min_delay_secs.is_finite() || config.min_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min-delay-secs must be >= 0, got {}",
            config.min_delay_secs
        )));
    }

    if !config.max_delay_secs.is_finite() || config.max_delay_secs < config.min_delay_secs {
        return Err(ConfigError::Validation(format!(
            "max-delay-secs ({}) must be >= min-delay-secs ({})",
            config.max_delay_secs, config.min_delay_secs
        )));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    if !config.retry_delay_secs.is_finite() || config.retry_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "retry-delay-secs must be >= 0, got {}",
            config.retry_delay_secs
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation("user-agent cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates enrichment batching
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.extract_max_chars < 1 || config.label_max_chars < 1 {
        return Err(ConfigError::Validation(
            "extract-max-chars and label-max-chars must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates classifier settings
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation("api-key-env cannot be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    if let Some(endpoint) = &config.endpoint {
        url::Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
    }

    if config.provider == Provider::Azure && config.endpoint.is_none() {
        return Err(ConfigError::Validation(
            "the azure provider requires an endpoint".to_string(),
        ));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation("data-dir cannot be empty".to_string()));
    }

    if config.state_dir.is_empty() {
        return Err(ConfigError::Validation("state-dir cannot be empty".to_string()));
    }

    if config.summary_path.as_deref() == Some("") {
        return Err(ConfigError::Validation("summary-path cannot be empty".to_string()));
    }

    Ok(())
}
