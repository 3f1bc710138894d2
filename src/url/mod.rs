//! URL handling module for Site-Harvest
//!
//! This module provides URL normalization, link resolution, crawl-scope
//! filtering and filesystem-safe identifiers derived from URLs.

mod normalize;
mod scope;
mod slug;

// Re-export main functions
pub use normalize::{normalize_url, resolve_link, strip_query_and_fragment};
pub use scope::{LinkFilter, ScopeFilter};
pub use slug::{sanitize_component, url_to_slug};
