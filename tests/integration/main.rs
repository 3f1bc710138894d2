//! Integration tests for Site-Harvest
//!
//! - `crawl_tests`: crawl bounds, resume and the full job pipeline over a fake site
//! - `enrichment_tests`: batched enrichment and result assembly
//! - `http_tests`: the HTTP renderer and LLM classifier against mock servers

mod common;
mod crawl_tests;
mod enrichment_tests;
mod http_tests;
