//! Crawler module for rendering pages and walking a site
//!
//! This module contains the core crawling logic, including:
//! - The `Renderer` seam and its HTTP implementation
//! - A fixed-delay retry wrapper
//! - Structural/referenced link classification
//! - The breadth-first frontier
//! - Overall crawl orchestration, and the full job pipeline

mod coordinator;
mod links;
mod renderer;
mod retry;
mod scheduler;

pub use coordinator::Orchestrator;
pub use links::{CategorizedLinks, LinkClassifier, ReferencedLink};
pub use renderer::{build_http_client, HttpRenderer, RenderError, Renderer};
pub use retry::{retry, retry_when};
pub use scheduler::{Admission, Frontier, FrontierSlot, QueuedUrl};

use crate::config::Config;
use crate::enrich::{Classifier, CrawlResult, Enricher};
use crate::extract::{InteractiveSection, Section};
use crate::output::{merge_pages, ArtifactWriter};
use crate::state::StateStore;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Everything recorded about one crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub main_content: String,
    pub interactive_sections: Vec<InteractiveSection>,

    /// Links worth recording but not following
    pub referenced_links: Vec<ReferencedLink>,

    /// Structural links found on the page, whether or not they were queued
    pub discovered_links: Vec<String>,

    pub parent_url: Option<String>,
    pub depth: u32,
    pub fetched_at: DateTime<Utc>,

    /// First substantial paragraph
    #[serde(default)]
    pub summary: String,

    /// Titled content blocks of the page
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// What one crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Recorded pages, in crawl order
    pub pages: Vec<PageRecord>,

    /// URLs rendered this run, failures excluded
    pub visited: Vec<Url>,

    /// URLs whose render failed after all retries
    pub failed: Vec<Url>,

    /// URLs dequeued but not rendered because an earlier run visited them
    pub skipped: Vec<Url>,

    pub duration: Duration,
}

/// Options for [`run_job`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Forget saved crawl state before starting
    pub fresh: bool,

    /// Stop after the crawl and write raw pages only
    pub skip_enrichment: bool,
}

/// Runs a complete job: crawl, enrich, synthesize, write artifacts
///
/// This is the main entry point for a job. It will:
/// 1. Open (or reset) the job's crawl state
/// 2. Crawl the site with `renderer`
/// 3. Merge the pages with pages recorded by earlier runs of the job; those
///    count against `max_pages`
/// 4. Write raw page records
/// 5. Enrich and synthesize through `classifier`, unless skipped
/// 6. Write enriched records, the final result and the Markdown summary
///
/// # Arguments
///
/// * `config` - The validated job file
/// * `config_hash` - Hash of the job file, stored with the crawl state
/// * `renderer` - Produces page HTML
/// * `classifier` - `None` skips enrichment
/// * `options` - Fresh start / crawl-only switches
///
/// # Returns
///
/// * `Ok(Some(result))` - The enriched result
/// * `Ok(None)` - Enrichment was skipped; raw pages were written
/// * `Err(HarvestError)` - The job could not start or artifacts could not be written
pub async fn run_job<R, C>(
    config: &Config,
    config_hash: Option<&str>,
    renderer: R,
    classifier: Option<C>,
    options: RunOptions,
) -> Result<Option<CrawlResult>, HarvestError>
where
    R: Renderer,
    C: Classifier,
{
    let mut store = StateStore::open(&config.output.state_dir, &config.job.job_name);
    if options.fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
        store.reset();
    }
    let resuming = !store.snapshot().visited.is_empty();
    if let Some(hash) = config_hash {
        store.set_config_hash(hash);
    }

    let writer = ArtifactWriter::new(config.job_dir());
    let previous = if resuming {
        writer.load_raw_pages()?
    } else {
        writer.clear_raw_pages()?;
        Vec::new()
    };

    let mut orchestrator =
        Orchestrator::new(config.job.clone(), config.crawler.clone(), renderer, store)?
            .with_prior_pages(previous.len())
            .with_artifacts(writer.clone());
    let outcome = orchestrator.run().await?;
    let state = orchestrator.store().snapshot();

    let mut pages = if resuming {
        merge_pages(previous, &outcome.pages)
    } else {
        outcome.pages.clone()
    };
    if pages.len() > config.job.max_pages {
        tracing::warn!(
            "Job holds {} pages, keeping the first {}",
            pages.len(),
            config.job.max_pages
        );
        pages.truncate(config.job.max_pages);
    }
    writer.write_raw_pages(&pages)?;

    let enrichment_enabled = config.enrichment.enabled && !options.skip_enrichment;
    let classifier = match classifier {
        Some(classifier) if enrichment_enabled => classifier,
        _ => {
            tracing::info!("Enrichment skipped; {} raw pages written", pages.len());
            writer.write_summary(&config.summary_path(), config, &outcome, &pages, None)?;
            return Ok(None);
        }
    };

    let enricher = Enricher::new(classifier, config.enrichment.clone());
    let enriched = enricher.enrich_all(&pages).await;
    if config.job.save_individual_pages {
        writer.write_enriched_pages(&enriched)?;
    }

    let synthesized = enricher
        .synthesize(&enriched, config.job.final_synthesis)
        .await;
    let result = CrawlResult::assemble(
        &config.job,
        &outcome,
        &state,
        pages.len(),
        enriched,
        synthesized,
    );

    writer.write_result(&result)?;
    writer.write_summary(&config.summary_path(), config, &outcome, &pages, Some(&result))?;

    Ok(Some(result))
}
