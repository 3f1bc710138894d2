//! Output module for writing job artifacts
//!
//! This module handles:
//! - Raw and enriched page records as individual JSON files
//! - The final `CrawlResult` document
//! - The Markdown run summary
//! - Statistics over persisted crawl state
//!
//! Layout under `<data-dir>/<job-slug>/`:
//!
//! ```text
//! raw_pages/page_001_<slug>.json
//! enriched_pages/page_001_<slug>.json
//! final_result.json
//! summary.md
//! ```

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics, RunSummary};

use crate::config::Config;
use crate::crawler::{CrawlOutcome, PageRecord};
use crate::enrich::{CrawlResult, EnrichedPageRecord};
use crate::url::url_to_slug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for OutputError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: String::new(),
            source,
        }
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

const RAW_DIR: &str = "raw_pages";
const ENRICHED_DIR: &str = "enriched_pages";
const RESULT_FILE: &str = "final_result.json";

/// File name of the `index`-th page (1-based)
pub fn page_file_name(index: usize, url: &str) -> String {
    format!("page_{:03}_{}.json", index, url_to_slug(url))
}

/// Writes the artifacts of one job
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    job_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(job_dir: impl Into<PathBuf>) -> Self {
        Self {
            job_dir: job_dir.into(),
        }
    }

    pub fn job_dir(&self) -> &Path {
        &self.job_dir
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.job_dir.join(RAW_DIR)
    }

    pub fn enriched_dir(&self) -> PathBuf {
        self.job_dir.join(ENRICHED_DIR)
    }

    pub fn result_path(&self) -> PathBuf {
        self.job_dir.join(RESULT_FILE)
    }

    /// Writes one JSON file per raw page, replacing the previous set
    pub fn write_raw_pages(&self, pages: &[PageRecord]) -> OutputResult<()> {
        let written = write_page_set(&self.raw_dir(), pages, |p| &p.url)?;
        tracing::info!("Wrote {} raw pages to {}", written, self.raw_dir().display());
        Ok(())
    }

    /// Removes raw pages left by an earlier crawl of the job
    pub fn clear_raw_pages(&self) -> OutputResult<()> {
        let removed = page_files(&self.raw_dir())?;
        for stale in &removed {
            std::fs::remove_file(stale).map_err(|e| with_path(e.into(), stale))?;
        }
        if !removed.is_empty() {
            tracing::info!("Removed {} raw pages of an earlier crawl", removed.len());
        }
        Ok(())
    }

    /// Writes the `index`-th raw page (1-based) without touching the others
    pub fn write_raw_page(&self, index: usize, page: &PageRecord) -> OutputResult<()> {
        let path = self.raw_dir().join(page_file_name(index, &page.url));
        write_json(&path, page)?;
        tracing::debug!("Saved raw page {}", path.display());
        Ok(())
    }

    /// Writes one JSON file per enriched page, replacing the previous set
    pub fn write_enriched_pages(&self, pages: &[EnrichedPageRecord]) -> OutputResult<()> {
        let written = write_page_set(&self.enriched_dir(), pages, |p| &p.url)?;
        tracing::info!(
            "Wrote {} enriched pages to {}",
            written,
            self.enriched_dir().display()
        );
        Ok(())
    }

    /// Reads the raw pages written by an earlier run, in file order
    ///
    /// Unreadable files are logged and skipped.
    pub fn load_raw_pages(&self) -> OutputResult<Vec<PageRecord>> {
        let mut pages = Vec::new();
        for path in page_files(&self.raw_dir())? {
            match read_json::<PageRecord>(&path) {
                Ok(page) => pages.push(page),
                Err(e) => tracing::warn!("Skipping unreadable page file: {}", e),
            }
        }
        Ok(pages)
    }

    /// Combines pages from earlier runs with the pages of this run
    ///
    /// Earlier pages keep their order; a page recorded again this run
    /// replaces its earlier copy. New pages follow in crawl order.
    pub fn merge_previous_pages(&self, current: &[PageRecord]) -> OutputResult<Vec<PageRecord>> {
        Ok(merge_pages(self.load_raw_pages()?, current))
    }

    /// Writes `final_result.json`
    pub fn write_result(&self, result: &CrawlResult) -> OutputResult<()> {
        let path = self.result_path();
        write_json(&path, result)?;
        tracing::info!("Wrote final result to {}", path.display());
        Ok(())
    }

    /// Writes the Markdown run summary to `path`
    pub fn write_summary(
        &self,
        path: &Path,
        config: &Config,
        outcome: &CrawlOutcome,
        pages: &[PageRecord],
        result: Option<&CrawlResult>,
    ) -> OutputResult<()> {
        let summary = RunSummary::new(config, outcome, pages, result);
        generate_markdown_summary(&summary, path).map_err(|e| with_path(e, path))?;
        tracing::info!("Wrote run summary to {}", path.display());
        Ok(())
    }
}

/// Combines `previous` pages with `current` ones
///
/// See [`ArtifactWriter::merge_previous_pages`].
pub fn merge_pages(previous: Vec<PageRecord>, current: &[PageRecord]) -> Vec<PageRecord> {
    let previous_count = previous.len();

    let mut merged: Vec<PageRecord> = previous
        .into_iter()
        .map(|page| {
            current
                .iter()
                .find(|c| c.url == page.url)
                .cloned()
                .unwrap_or(page)
        })
        .collect();
    for page in current {
        if !merged.iter().any(|m| m.url == page.url) {
            merged.push(page.clone());
        }
    }

    tracing::info!(
        "Resumed job: {} pages from earlier runs, {} total",
        previous_count,
        merged.len()
    );
    merged
}

/// Replaces the `page_*.json` files in `dir` with one file per item
fn write_page_set<T, F>(dir: &Path, items: &[T], url_of: F) -> OutputResult<usize>
where
    T: Serialize,
    F: Fn(&T) -> &str,
{
    std::fs::create_dir_all(dir).map_err(|e| with_path(e.into(), dir))?;

    for stale in page_files(dir)? {
        std::fs::remove_file(&stale).map_err(|e| with_path(e.into(), &stale))?;
    }

    for (i, item) in items.iter().enumerate() {
        let path = dir.join(page_file_name(i + 1, url_of(item)));
        write_json(&path, item)?;
    }
    Ok(items.len())
}

/// `page_*.json` files in `dir`, sorted by name; empty if `dir` is missing
fn page_files(dir: &Path) -> OutputResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| with_path(e.into(), dir))? {
        let path = entry.map_err(|e| with_path(e.into(), dir))?.path();
        let is_page = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("page_") && n.ends_with(".json"));
        if is_page {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| OutputError::Json {
        path: path.display().to_string(),
        source,
    })?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| with_path(e.into(), dir))?;
    }
    std::fs::write(path, json).map_err(|e| with_path(e.into(), path))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> OutputResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| with_path(e.into(), path))?;
    serde_json::from_str(&content).map_err(|source| OutputError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Attaches `path` to an I/O error that lacks one
fn with_path(error: OutputError, path: &Path) -> OutputError {
    match error {
        OutputError::Io { path: p, source } if p.is_empty() => OutputError::Io {
            path: path.display().to_string(),
            source,
        },
        other => other,
    }
}
