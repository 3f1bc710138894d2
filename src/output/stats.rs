//! Statistics over crawl state and run output
//!
//! This module provides the numbers behind `--state` and the Markdown run
//! summary.

use crate::config::Config;
use crate::crawler::{CrawlOutcome, PageRecord};
use crate::enrich::CrawlResult;
use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Progress recorded in a job's state file
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub job_name: String,

    /// URLs rendered successfully across all runs
    pub visited: usize,

    /// URLs whose render failed
    pub failed: usize,

    /// URLs still waiting in the persisted frontier
    pub queued: usize,

    /// Queued URL count per depth
    pub queued_by_depth: BTreeMap<u32, usize>,

    pub failed_urls: Vec<String>,
    pub config_hash: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CrawlStatistics {
    /// Computes statistics from a persisted crawl state
    pub fn from_state(state: &CrawlState) -> Self {
        let mut queued_by_depth = BTreeMap::new();
        for entry in &state.queued {
            *queued_by_depth.entry(entry.depth).or_insert(0) += 1;
        }

        Self {
            job_name: state.job_name.clone(),
            visited: state.visited.len(),
            failed: state.failed.len(),
            queued: state.queued.len(),
            queued_by_depth,
            failed_urls: state.failed.iter().cloned().collect(),
            config_hash: state.config_hash.clone(),
            last_updated: state.last_updated,
        }
    }

    /// Share of attempted URLs that rendered, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.visited + self.failed;
        if attempted == 0 {
            0.0
        } else {
            (self.visited as f64 / attempted as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl State: {} ===\n", stats.job_name);

    println!("Overview:");
    println!("  Visited: {}", stats.visited);
    println!("  Failed: {}", stats.failed);
    println!("  Queued: {}", stats.queued);
    match stats.last_updated {
        Some(when) => println!("  Last updated: {}", when.to_rfc3339()),
        None => println!("  Last updated: never"),
    }
    if let Some(hash) = &stats.config_hash {
        println!("  Job file hash: {}", hash);
    }
    println!();

    if !stats.queued_by_depth.is_empty() {
        println!("Queued by depth:");
        for (depth, count) in &stats.queued_by_depth {
            println!("  Depth {}: {}", depth, count);
        }
        println!();
    }

    if !stats.failed_urls.is_empty() {
        println!("Failed URLs ({}):", stats.failed_urls.len());
        for url in &stats.failed_urls {
            println!("  - {}", url);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} attempted pages rendered)",
        stats.success_rate(),
        stats.visited,
        stats.visited + stats.failed
    );
}

/// Everything the Markdown summary reports about one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub job_name: String,
    pub start_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    pub link_filter: String,
    pub duration_secs: f64,

    /// Pages recorded by this run
    pub pages_recorded: usize,

    /// Pages in the job's output, earlier runs included
    pub total_pages: usize,

    pub failed_urls: Vec<String>,
    pub skipped: usize,

    /// Page count per depth
    pub depth_breakdown: BTreeMap<u32, usize>,

    pub referenced_links: usize,
    pub interactive_sections: usize,

    /// (title, url, depth) of each page, in output order
    pub pages: Vec<(String, String, u32)>,

    /// Set when enrichment ran
    pub successful_enrichments: Option<usize>,

    /// Page count per classified content type
    pub content_types: BTreeMap<String, usize>,

    pub synthesized_fields: Vec<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// Collects summary figures from a finished run
    pub fn new(
        config: &Config,
        outcome: &CrawlOutcome,
        pages: &[PageRecord],
        result: Option<&CrawlResult>,
    ) -> Self {
        let mut depth_breakdown = BTreeMap::new();
        for page in pages {
            *depth_breakdown.entry(page.depth).or_insert(0) += 1;
        }

        let mut summary = Self {
            job_name: config.job.job_name.clone(),
            start_url: config.job.start_url.clone(),
            max_depth: config.job.max_depth,
            max_pages: config.job.max_pages,
            link_filter: config.job.link_filter.to_string(),
            duration_secs: outcome.duration.as_secs_f64(),
            pages_recorded: outcome.pages.len(),
            total_pages: pages.len(),
            failed_urls: outcome.failed.iter().map(|u| u.to_string()).collect(),
            skipped: outcome.skipped.len(),
            depth_breakdown,
            referenced_links: pages.iter().map(|p| p.referenced_links.len()).sum(),
            interactive_sections: pages.iter().map(|p| p.interactive_sections.len()).sum(),
            pages: pages
                .iter()
                .map(|p| (p.title.clone(), p.url.clone(), p.depth))
                .collect(),
            finished_at: Some(Utc::now()),
            ..Self::default()
        };

        if let Some(result) = result {
            summary.successful_enrichments = Some(result.metadata.successful_enrichments);
            for page in result.main_page.iter().chain(result.child_pages.iter()) {
                *summary
                    .content_types
                    .entry(page.content_type.clone())
                    .or_insert(0) += 1;
            }
            summary.synthesized_fields = result.synthesized_fields.keys().cloned().collect();
        }

        summary
    }
}
