//! Link classification
//!
//! Every anchor on a rendered page ends up in exactly one of three buckets:
//! - **structural**: navigation inside the site section being harvested
//!   (tabs, section menus, tiles, related-section blocks). These are queued.
//! - **referenced**: ordinary in-content links. These are recorded with some
//!   surrounding text and never followed.
//! - **ignored**: site chrome, utility links, non-page targets and anything
//!   outside the crawl scope.
//!
//! Classification reads the page before junk removal so that tiles and
//! section menus living inside `<nav>` or `<aside>` are still seen.

use crate::dom::{compile, compile_all, Document, Element};
use crate::extract::{clean_text, ellipsize};
use crate::url::{resolve_link, strip_query_and_fragment, ScopeFilter};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Characters of surrounding text kept for a referenced link
const CONTEXT_CHARS: usize = 200;

/// Enclosing elements a referenced link's context is taken from
const CONTEXT_TAGS: &[&str] = &["p", "li", "td", "div"];

/// Navigation widgets whose anchors lead to more of the same section
const STRUCTURAL_SELECTORS: &[&str] = &[
    // Tabs
    "[role='tab']",
    "[data-tab]",
    ".tab-button",
    ".nav-tabs",
    // Accordions
    ".accordion-button",
    ".accordion-header",
    "summary",
    // Section navigation
    "nav.section-nav",
    ".section-menu",
    ".sidebar-nav",
    ".table-of-contents",
    // Cards and tiles
    ".card.clickable",
    "a.section-card",
    "a.tile",
    // Related sections
    ".next-section",
    ".related-section",
    ".sub-section",
];

/// Site chrome and utility links that are never followed or recorded
const IGNORE_SELECTORS: &[&str] = &[
    "footer",
    "header",
    "nav.main-nav",
    ".site-nav",
    ".breadcrumb",
    ".breadcrumbs",
    "[aria-label='breadcrumb']",
    ".pagination",
    ".social-media",
    ".social-share",
    "a.external-link",
    "a[target='_blank']",
    "a.skip-link",
    "a[href^='#top']",
];

/// Class-name fragments that mark an anchor as navigation
const STRUCTURAL_CLASS_HINTS: &[&str] = &["section", "tab", "accordion", "nav", "tile", "card"];

/// Href fragments that mark an anchor as navigation
const STRUCTURAL_HREF_HINTS: &[&str] = &["/section/", "/category/", "/topic/"];

/// Tile containers searched before anything else, in order
const TILE_SELECTORS: &[&str] = &[
    ".tiles-container .tile",
    ".card, .tile, [class*='card'], [class*='tile']",
];

/// A link worth recording but not following
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedLink {
    /// Anchor text
    pub text: String,
    /// Absolute URL as linked
    pub url: String,
    /// Up to 200 characters of the enclosing paragraph, item, cell or block
    pub context: String,
}

/// The result of classifying one page's anchors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedLinks {
    /// Normalized URLs to crawl, in discovery order, without duplicates
    pub structural: Vec<Url>,
    /// In-content references, first occurrence per URL
    pub referenced: Vec<ReferencedLink>,
}

/// Splits a page's anchors into structural and referenced links
pub struct LinkClassifier {
    scope: ScopeFilter,
    follow_all_links: bool,
    anchors: Option<Selector>,
    structural: Vec<Selector>,
    ignored: Vec<Selector>,
    tiles: Vec<Selector>,
}

impl LinkClassifier {
    /// Creates a classifier for one crawl
    ///
    /// # Arguments
    ///
    /// * `scope` - Admissibility filter derived from the seed URL
    /// * `follow_all_links` - Treat every admissible, non-ignored anchor as structural
    pub fn new(scope: ScopeFilter, follow_all_links: bool) -> Self {
        Self {
            scope,
            follow_all_links,
            anchors: compile("a[href]"),
            structural: compile_all(STRUCTURAL_SELECTORS),
            ignored: compile_all(IGNORE_SELECTORS),
            tiles: compile_all(TILE_SELECTORS),
        }
    }

    /// The scope filter this classifier applies
    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    /// Classifies every anchor of `doc`
    ///
    /// # Arguments
    ///
    /// * `doc` - The rendered page, before junk removal
    /// * `page_url` - URL the page was rendered from; relative hrefs resolve against it
    ///
    /// # Returns
    ///
    /// Structural URLs (normalized, deduplicated) and referenced links.
    /// Anchors outside the scope appear in neither list.
    pub fn categorize(&self, doc: &Document, page_url: &Url) -> CategorizedLinks {
        let mut result = CategorizedLinks::default();
        let mut seen: HashSet<Url> = HashSet::new();

        self.collect_tiles(doc, page_url, &mut seen, &mut result);

        let Some(anchors) = &self.anchors else {
            return result;
        };

        for anchor in doc.select_with(anchors) {
            let Some(href) = anchor.attr("href") else {
                continue;
            };

            if anchor.attr("download").is_some() || anchor.is_within(&self.ignored) {
                tracing::debug!("Ignoring chrome/utility link: {}", href);
                continue;
            }

            let is_fragment = href.trim().starts_with('#');
            if self.follow_all_links && is_fragment {
                continue;
            }

            let Some(absolute) = resolve_link(href, page_url) else {
                continue;
            };
            let normalized = strip_query_and_fragment(&absolute);

            if !seen.insert(normalized.clone()) {
                continue;
            }

            if !self.scope.should_follow(&normalized) {
                tracing::debug!("Out of scope: {}", normalized);
                continue;
            }

            if self.follow_all_links || self.is_structural(anchor, href) {
                tracing::debug!("Structural link: {}", normalized);
                result.structural.push(normalized);
            } else {
                tracing::debug!("Referenced link: {}", absolute);
                result.referenced.push(ReferencedLink {
                    text: clean_text(&anchor.text()),
                    url: absolute.to_string(),
                    context: Self::context_of(anchor),
                });
            }
        }

        tracing::info!(
            "Categorized {} structural links, {} referenced links on {}",
            result.structural.len(),
            result.referenced.len(),
            page_url
        );
        result
    }

    /// Tile and card links are structural regardless of ignore rules
    fn collect_tiles(
        &self,
        doc: &Document,
        page_url: &Url,
        seen: &mut HashSet<Url>,
        result: &mut CategorizedLinks,
    ) {
        let Some(anchors) = &self.anchors else {
            return;
        };

        for tile_selector in &self.tiles {
            for tile in doc.select_with(tile_selector) {
                let link = if tile.matches(anchors) {
                    Some(tile)
                } else {
                    tile.select_first(anchors)
                };
                let Some(href) = link.and_then(|a| a.attr("href")) else {
                    continue;
                };
                let Some(absolute) = resolve_link(href, page_url) else {
                    continue;
                };
                let normalized = strip_query_and_fragment(&absolute);

                if seen.contains(&normalized) || !self.scope.should_follow(&normalized) {
                    continue;
                }

                tracing::debug!("Tile link: {}", normalized);
                seen.insert(normalized.clone());
                result.structural.push(normalized);
            }
        }
    }

    fn is_structural(&self, anchor: Element<'_>, href: &str) -> bool {
        if anchor.is_within(&self.structural) {
            return true;
        }

        let class = anchor.class_attr().to_lowercase();
        if STRUCTURAL_CLASS_HINTS.iter().any(|hint| class.contains(hint)) {
            return true;
        }

        if STRUCTURAL_HREF_HINTS.iter().any(|hint| href.contains(hint)) {
            return true;
        }

        // In-page section anchor
        let href = href.trim();
        href.starts_with('#') && href.len() > 1
    }

    fn context_of(anchor: Element<'_>) -> String {
        anchor
            .closest_tag(CONTEXT_TAGS)
            .map(|block| ellipsize(&clean_text(&block.text()), CONTEXT_CHARS))
            .unwrap_or_default()
    }
}
