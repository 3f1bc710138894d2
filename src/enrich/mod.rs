//! Enrichment module for classifying and synthesizing crawled pages
//!
//! This module handles:
//! - The `Classifier` seam and its LLM-backed implementation
//! - Batched, bounded-concurrency extraction over all crawled pages
//! - Optional synthesis of every enriched page into one structure
//! - Assembling the final `CrawlResult`

mod classifier;
mod enricher;
mod llm;
mod prompts;

pub use classifier::{
    normalize_label, parse_json_response, Classifier, ClassifyError, Extraction,
    CANONICAL_LABELS, FALLBACK_LABEL, UNKNOWN_CONTENT_TYPE,
};
pub use enricher::{combine_content, Enricher};
pub use llm::LlmClassifier;

use crate::config::CrawlJob;
use crate::crawler::CrawlOutcome;
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A detail-page section with its canonical label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledSection {
    pub title: String,
    pub label: String,
    pub content: String,
}

/// A crawled page after classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPageRecord {
    pub url: String,
    pub title: String,
    pub content_type: String,
    pub summary: String,
    pub structured_fields: Map<String, Value>,
    pub parent_url: Option<String>,
    pub depth: u32,

    /// Labelled sections, when section labelling is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<LabelledSection>,
}

/// Counts describing one job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlMetadata {
    /// Pages handed to enrichment, including pages recorded by earlier runs
    pub total_pages: usize,
    /// Duration of the latest run
    pub duration_secs: f64,

    /// URLs rendered across all runs of the job
    pub visited: usize,
    pub failed: usize,
    pub failed_urls: Vec<String>,
    pub successful_enrichments: usize,
}

/// Final output of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub job_name: String,
    pub start_url: String,
    pub metadata: CrawlMetadata,

    /// The seed page (depth 0), when it was enriched
    pub main_page: Option<EnrichedPageRecord>,

    /// Every other enriched page
    pub child_pages: Vec<EnrichedPageRecord>,

    pub synthesized_fields: Map<String, Value>,
    pub crawled_at: DateTime<Utc>,
}

impl CrawlResult {
    /// Builds the result of a job from its crawl and enrichment output
    ///
    /// The first depth-0 page becomes `main_page`; all other pages become
    /// `child_pages` in their original order. Visited and failed counts come
    /// from `state`, so they cover every run of the job like `total_pages`.
    pub fn assemble(
        job: &CrawlJob,
        outcome: &CrawlOutcome,
        state: &CrawlState,
        total_pages: usize,
        enriched: Vec<EnrichedPageRecord>,
        synthesized_fields: Map<String, Value>,
    ) -> Self {
        let successful_enrichments = enriched.len();

        let mut main_page = None;
        let mut child_pages = Vec::with_capacity(enriched.len());
        for page in enriched {
            if page.depth == 0 && main_page.is_none() {
                main_page = Some(page);
            } else {
                child_pages.push(page);
            }
        }

        Self {
            job_name: job.job_name.clone(),
            start_url: job.start_url.clone(),
            metadata: CrawlMetadata {
                total_pages,
                duration_secs: outcome.duration.as_secs_f64(),
                visited: state.visited.len(),
                failed: state.failed.len(),
                failed_urls: state.failed.iter().cloned().collect(),
                successful_enrichments,
            },
            main_page,
            child_pages,
            synthesized_fields,
            crawled_at: Utc::now(),
        }
    }
}
