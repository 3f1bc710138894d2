//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Lifecycle of a single URL within one run (pending, rendering, recorded, ...)
//! - `StateStore`: Durable per-job record of visited, failed and queued URLs
//! - `CrawlState`: The persisted document itself

mod page_state;
mod store;

// Re-export main types
pub use page_state::PageState;
pub use store::{CrawlState, QueuedEntry, StateError, StateStore};
