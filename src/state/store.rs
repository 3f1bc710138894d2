//! Durable crawl progress
//!
//! One JSON document per job records which URLs were visited, which failed,
//! and what was still queued. The document is rewritten after every page so
//! an interrupted crawl resumes close to where it stopped.
//!
//! Persistence failures never abort a crawl: they are logged and the
//! in-memory state stays authoritative.

use crate::extract::truncate_chars;
use crate::url::sanitize_component;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the state file
#[derive(Debug, Error)]
pub enum StateError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEntry {
    pub url: String,
    pub depth: u32,
}

/// Persisted progress of one job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    pub job_name: String,

    /// Hash of the job file that produced this state
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Frontier in dequeue order
    #[serde(default)]
    pub queued: Vec<QueuedEntry>,

    #[serde(default)]
    pub visited: BTreeSet<String>,

    #[serde(default)]
    pub failed: BTreeSet<String>,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CrawlState {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            ..Self::default()
        }
    }

    /// True when no URL is both visited and queued
    pub fn is_consistent(&self) -> bool {
        self.queued.iter().all(|entry| !self.visited.contains(&entry.url))
    }
}

/// Reads and writes the crawl state of one job
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: CrawlState,
}

impl StateStore {
    /// Opens the store for `job_name` under `state_dir`
    ///
    /// An existing state file is loaded. A missing file starts an empty
    /// state; a corrupt one is logged and also starts empty.
    pub fn open(state_dir: impl AsRef<Path>, job_name: &str) -> Self {
        let path = Self::state_path(state_dir.as_ref(), job_name);

        let state = match Self::load(&path) {
            Ok(Some(state)) => {
                tracing::info!(
                    "Loaded crawl state from {}: {} visited, {} failed, {} queued",
                    path.display(),
                    state.visited.len(),
                    state.failed.len(),
                    state.queued.len()
                );
                state
            }
            Ok(None) => {
                tracing::info!("No existing crawl state at {}", path.display());
                CrawlState::new(job_name)
            }
            Err(e) => {
                tracing::error!("Failed to load crawl state from {}: {}", path.display(), e);
                CrawlState::new(job_name)
            }
        };

        Self { path, state }
    }

    /// Location of the state file for a job
    pub fn state_path(state_dir: &Path, job_name: &str) -> PathBuf {
        let slug = sanitize_component(job_name);
        let slug = if slug.is_empty() { "job".to_string() } else { slug };
        state_dir.join(format!("{}.json", slug))
    }

    /// Reads a state file
    ///
    /// # Returns
    ///
    /// * `Ok(Some(state))` - The file exists and parsed
    /// * `Ok(None)` - No file at `path`
    /// * `Err(StateError)` - Unreadable or corrupt
    pub fn load(path: &Path) -> Result<Option<CrawlState>, StateError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.state.visited.contains(url)
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.state.failed.contains(url)
    }

    /// Records `url` as visited and persists immediately
    pub fn mark_visited(&mut self, url: &str) {
        self.state.queued.retain(|entry| entry.url != url);
        self.state.failed.remove(url);
        self.state.visited.insert(url.to_string());
        self.persist();
    }

    /// Records a render failure and persists
    ///
    /// A failed URL is no longer counted as visited, so a later run retries it.
    pub fn mark_failed(&mut self, url: &str) {
        self.state.visited.remove(url);
        self.state.queued.retain(|entry| entry.url != url);
        self.state.failed.insert(url.to_string());
        self.persist();
    }

    /// Replaces the persisted frontier; visited URLs are dropped from it
    pub fn set_queued(&mut self, entries: Vec<QueuedEntry>) {
        let visited = &self.state.visited;
        self.state.queued = entries
            .into_iter()
            .filter(|entry| !visited.contains(&entry.url))
            .collect();
    }

    /// Persisted frontier, in dequeue order
    pub fn queued(&self) -> &[QueuedEntry] {
        &self.state.queued
    }

    pub fn config_hash(&self) -> Option<&str> {
        self.state.config_hash.as_deref()
    }

    /// Records the hash of the job file driving this run
    ///
    /// Logs a warning when resuming state produced by a different job file.
    pub fn set_config_hash(&mut self, hash: &str) {
        if let Some(previous) = &self.state.config_hash {
            if previous != hash && !self.state.visited.is_empty() {
                tracing::warn!(
                    "Job file changed since the saved crawl state was written ({} -> {}); \
                     resuming anyway, use --fresh to start over",
                    truncate_chars(previous, 12),
                    truncate_chars(hash, 12)
                );
            }
        }
        self.state.config_hash = Some(hash.to_string());
    }

    /// Forgets all progress and deletes the state file
    ///
    /// Crawl artifacts are left untouched.
    pub fn reset(&mut self) {
        let job_name = std::mem::take(&mut self.state.job_name);
        self.state = CrawlState::new(job_name);

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Removed crawl state {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!("Failed to remove crawl state {}: {}", self.path.display(), e),
        }
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> CrawlState {
        self.state.clone()
    }

    /// Writes the full state, reporting failures
    ///
    /// The document goes to a temporary file first and is renamed over the
    /// previous one, so a crash mid-write never leaves a truncated file.
    pub fn save(&mut self) -> Result<(), StateError> {
        self.state.last_updated = Some(Utc::now());

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "Saved crawl state: {} visited, {} queued",
            self.state.visited.len(),
            self.state.queued.len()
        );
        Ok(())
    }

    /// Writes the full state, logging and swallowing failures
    pub fn persist(&mut self) {
        if let Err(e) = self.save() {
            tracing::error!("Failed to save crawl state to {}: {}", self.path.display(), e);
        }
    }
}
