//! Crawl orchestrator - main crawl loop
//!
//! This module contains the breadth-first loop that ties the crawl together:
//! - Seeding the frontier (and restoring the queue of an interrupted run)
//! - Skipping URLs the state store already marks visited
//! - Rendering each page through the retry wrapper
//! - Splitting links into structural and referenced sets
//! - Extracting content and recording a `PageRecord`
//! - Persisting progress after every page
//! - Pacing renders with a random delay

use crate::config::{CrawlJob, CrawlerConfig};
use crate::crawler::links::LinkClassifier;
use crate::crawler::renderer::{RenderError, Renderer};
use crate::crawler::retry::retry_when;
use crate::crawler::scheduler::{Admission, Frontier, QueuedUrl};
use crate::crawler::{CrawlOutcome, PageRecord};
use crate::dom::Document;
use crate::extract::{extract_with, remove_junk, ExtractOptions};
use crate::output::ArtifactWriter;
use crate::state::{PageState, StateStore};
use crate::url::{normalize_url, ScopeFilter};
use crate::HarvestError;
use chrono::Utc;
use rand::Rng;
use std::time::{Duration, Instant};
use url::Url;

/// Runs one crawl job against a renderer
///
/// The orchestrator owns the frontier and the state store for the duration
/// of the run. Rendering is sequential: one page at a time, separated by a
/// random pause.
pub struct Orchestrator<R: Renderer> {
    job: CrawlJob,
    crawler: CrawlerConfig,
    renderer: R,
    store: StateStore,
    links: LinkClassifier,
    frontier: Frontier,
    seed: Url,

    /// Pages recorded by earlier runs; they count against `max_pages`
    prior_pages: usize,

    /// Receives each raw page as soon as it is recorded
    artifacts: Option<ArtifactWriter>,
}

impl<R: Renderer> Orchestrator<R> {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `job` - What to crawl
    /// * `crawler` - Pacing and retry settings
    /// * `renderer` - Produces the HTML of each page
    /// * `store` - Crawl state of this job, possibly from an earlier run
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(HarvestError)` - The start URL is not a crawlable URL
    pub fn new(
        job: CrawlJob,
        crawler: CrawlerConfig,
        renderer: R,
        store: StateStore,
    ) -> Result<Self, HarvestError> {
        let seed = normalize_url(&job.start_url)?;
        let scope = ScopeFilter::new(&seed, job.link_filter);
        let links = LinkClassifier::new(scope, job.follow_all_links);
        let frontier = Frontier::new(job.max_depth);

        Ok(Self {
            job,
            crawler,
            renderer,
            store,
            links,
            frontier,
            seed,
            prior_pages: 0,
            artifacts: None,
        })
    }

    /// Counts `count` pages from earlier runs against the page limit
    pub fn with_prior_pages(mut self, count: usize) -> Self {
        self.prior_pages = count;
        self
    }

    /// Writes every recorded page to `writer`'s raw page directory at once,
    /// so an interrupted run keeps the pages its state marks visited
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Gives the state store back, e.g. to reset it after a run
    pub fn into_store(self) -> StateStore {
        self.store
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Seeds the frontier with the start URL and any persisted queue
    /// 2. Pops URLs in FIFO order until the queue drains or `max_pages` is
    ///    reached, counting pages recorded by earlier runs
    /// 3. Skips URLs visited by an earlier run
    /// 4. Renders, classifies links, extracts and records each page
    /// 5. Queues structural links one level deeper
    ///
    /// A page that fails to render is recorded as failed and never retried
    /// within the run; it never aborts the crawl.
    pub async fn run(&mut self) -> Result<CrawlOutcome, HarvestError> {
        let start_time = Instant::now();
        tracing::info!(
            "Starting crawl '{}' at {} (max depth {}, max pages {}, filter {})",
            self.job.job_name,
            self.seed,
            self.job.max_depth,
            self.job.max_pages,
            self.job.link_filter
        );

        self.seed_frontier();

        let mut pages = Vec::new();
        let mut rendered_any = false;

        if self.prior_pages >= self.job.max_pages {
            tracing::info!(
                "Page limit {} already reached by earlier runs ({} pages)",
                self.job.max_pages,
                self.prior_pages
            );
        }

        while self.prior_pages + pages.len() < self.job.max_pages {
            let Some(next) = self.frontier.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if self.store.is_visited(next.url.as_str()) {
                tracing::debug!("Skipping {} (visited in an earlier run)", next.url);
                self.frontier.transition(&next.url, PageState::Skipped)?;
                continue;
            }
            if next.depth > self.job.max_depth {
                self.frontier.transition(&next.url, PageState::Skipped)?;
                continue;
            }

            if rendered_any {
                self.pause().await;
            }
            rendered_any = true;

            if let Some(record) = self.process_url(next).await? {
                let index = self.prior_pages + pages.len() + 1;
                if let Some(writer) = &self.artifacts {
                    if let Err(e) = writer.write_raw_page(index, &record) {
                        tracing::error!("Failed to save raw page {}: {}", record.url, e);
                    }
                }
                pages.push(record);
                tracing::info!(
                    "Progress: {}/{} pages recorded, {} queued",
                    index,
                    self.job.max_pages,
                    self.frontier.queued_len()
                );
            }

            self.store.set_queued(self.frontier.queued_entries());
            self.store.persist();
        }

        if !self.frontier.is_empty() {
            tracing::info!(
                "Page limit {} reached with {} URLs still queued",
                self.job.max_pages,
                self.frontier.queued_len()
            );
        }

        self.store.set_queued(self.frontier.queued_entries());
        self.store.persist();

        let outcome = CrawlOutcome {
            visited: self.frontier.visited_urls(),
            failed: self.frontier.failed_urls(),
            skipped: self.frontier.urls_with_state(PageState::Skipped),
            pages,
            duration: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} pages recorded, {} failed, {} skipped in {:?}",
            outcome.pages.len(),
            outcome.failed.len(),
            outcome.skipped.len(),
            outcome.duration
        );

        Ok(outcome)
    }

    /// Queues the seed, then whatever an interrupted run left queued
    fn seed_frontier(&mut self) {
        self.frontier.enqueue(self.seed.clone(), 0, None);

        let restored: Vec<_> = self.store.queued().to_vec();
        if restored.is_empty() {
            return;
        }

        let mut count = 0;
        for entry in restored {
            let url = match normalize_url(&entry.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Dropping persisted queue entry {}: {}", entry.url, e);
                    continue;
                }
            };
            if !self.links.scope().should_follow(&url) {
                tracing::debug!("Dropping persisted queue entry {} (out of scope)", url);
                continue;
            }
            if self.frontier.enqueue(url, entry.depth, None) == Admission::Queued {
                count += 1;
            }
        }
        tracing::info!("Restored {} queued URLs from the previous run", count);
    }

    /// Renders one page and turns it into a record
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The page was rendered and recorded
    /// * `Ok(None)` - Rendering failed after all retries
    /// * `Err(HarvestError)` - The page lifecycle was violated
    async fn process_url(&mut self, next: QueuedUrl) -> Result<Option<PageRecord>, HarvestError> {
        let QueuedUrl {
            url,
            depth,
            parent_url,
        } = next;

        tracing::info!("Crawling {} (depth {})", url, depth);
        self.frontier.transition(&url, PageState::Rendering)?;
        self.store.mark_visited(url.as_str());

        let html = match self.render(&url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render {}: {}", url, e);
                self.frontier.transition(&url, PageState::Failed)?;
                self.store.mark_failed(url.as_str());
                return Ok(None);
            }
        };

        self.frontier.transition(&url, PageState::Extracting)?;

        let mut doc = Document::parse(&html);

        // Links are read before junk removal: navigation menus hold most structural links
        let categorized = self.links.categorize(&doc, &url);
        tracing::debug!(
            "{}: {} structural links, {} referenced links",
            url,
            categorized.structural.len(),
            categorized.referenced.len()
        );

        let discovered_links = self.queue_links(&url, depth, &categorized.structural);

        remove_junk(&mut doc);
        let content = extract_with(
            &doc,
            &ExtractOptions {
                content_area: self.job.content_area_selector.clone(),
                interactive: self.job.expand_interactive,
            },
        );

        if content.main_content.is_empty() {
            tracing::warn!("No main content extracted from {}", url);
        }

        let record = PageRecord {
            url: url.to_string(),
            title: content.title,
            main_content: content.main_content,
            interactive_sections: content.interactive_sections,
            referenced_links: categorized.referenced,
            discovered_links,
            parent_url: parent_url.map(|u| u.to_string()),
            depth,
            fetched_at: Utc::now(),
            summary: content.summary,
            sections: content.sections,
        };

        self.frontier.transition(&url, PageState::Recorded)?;
        tracing::info!("Recorded '{}' ({})", record.title, record.url);

        Ok(Some(record))
    }

    /// Renders `url`, retrying transient failures
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        let renderer = &self.renderer;
        retry_when(
            move |attempt| {
                if attempt > 1 {
                    tracing::debug!("Render attempt {} for {}", attempt, url);
                }
                renderer.render(url)
            },
            self.crawler.retry_attempts,
            self.crawler.retry_delay(),
            RenderError::is_retryable,
        )
        .await
    }

    /// Queues structural links one level below the page
    ///
    /// # Returns
    ///
    /// Every structural link of the page, queued or not
    fn queue_links(&mut self, page_url: &Url, depth: u32, structural: &[Url]) -> Vec<String> {
        let mut queued = 0;
        for link in structural {
            if self.store.is_visited(link.as_str()) {
                continue;
            }
            match self.frontier.enqueue(link.clone(), depth + 1, Some(page_url)) {
                Admission::Queued => queued += 1,
                Admission::Known => {}
                Admission::TooDeep => {
                    tracing::debug!("Recording {} as discovered only (too deep)", link);
                }
            }
        }

        if queued > 0 {
            tracing::debug!("Queued {} new URLs from {}", queued, page_url);
        }

        structural.iter().map(Url::to_string).collect()
    }

    /// Sleeps a uniform random time within the configured delay range
    async fn pause(&self) {
        let delay = random_delay(self.crawler.min_delay_secs, self.crawler.max_delay_secs);
        if !delay.is_zero() {
            tracing::debug!("Waiting {:.1}s before the next page", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}

/// Uniform random duration in `[min_secs, max_secs]`
fn random_delay(min_secs: f64, max_secs: f64) -> Duration {
    let min_secs = min_secs.max(0.0);
    let secs = if max_secs > min_secs {
        rand::rng().random_range(min_secs..=max_secs)
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs)
}
