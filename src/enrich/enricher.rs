//! Batched enrichment of crawled pages
//!
//! Pages are classified in fixed-size batches. Calls within a batch run
//! concurrently; the next batch starts only after the previous one has
//! fully resolved and the configured pause has passed. A page whose
//! classification fails is logged and left out of the result.

use crate::config::EnrichmentConfig;
use crate::crawler::PageRecord;
use crate::enrich::classifier::{Classifier, ClassifyError, FALLBACK_LABEL};
use crate::enrich::{EnrichedPageRecord, LabelledSection};
use crate::extract::{truncate_chars, Section};
use futures::future::join_all;
use serde_json::{Map, Value};

const TRUNCATION_MARKER: &str = "\n...(content truncated)...";

/// Combines a page's text into the single document sent for extraction
///
/// Layout:
///
/// ```text
/// === Main Content ===
/// <main content>
///
/// === Interactive Sections ===
///
/// [TAB] Eligibility
/// <content>
///
/// === Referenced Links ===
/// - <text>: <url>
/// ```
///
/// Empty parts are left out; at most `max_links` referenced links are listed.
pub fn combine_content(page: &PageRecord, max_links: usize) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !page.main_content.is_empty() {
        parts.push("=== Main Content ===".to_string());
        parts.push(page.main_content.clone());
    }

    if !page.interactive_sections.is_empty() {
        parts.push("\n=== Interactive Sections ===".to_string());
        for section in &page.interactive_sections {
            parts.push(format!(
                "\n[{}] {}",
                section.kind.as_str().to_uppercase(),
                section.name
            ));
            parts.push(section.content.clone());
        }
    }

    if !page.referenced_links.is_empty() && max_links > 0 {
        parts.push("\n=== Referenced Links ===".to_string());
        for link in page.referenced_links.iter().take(max_links) {
            parts.push(format!("- {}: {}", link.text, link.url));
        }
    }

    parts.join("\n")
}

/// `text` cut to `max_chars`, with a marker when anything was dropped
fn clip(text: &str, max_chars: usize) -> String {
    let kept = truncate_chars(text, max_chars);
    if kept.len() < text.len() {
        format!("{}{}", kept, TRUNCATION_MARKER)
    } else {
        kept.to_string()
    }
}

/// Runs crawled pages through a [`Classifier`]
pub struct Enricher<C: Classifier> {
    classifier: C,
    config: EnrichmentConfig,
}

impl<C: Classifier> Enricher<C> {
    pub fn new(classifier: C, config: EnrichmentConfig) -> Self {
        Self { classifier, config }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Extracts structured fields from one page
    ///
    /// # Errors
    ///
    /// Whatever the classifier's `extract` call returns. Section labelling
    /// failures are not errors; those sections are labelled `other`.
    pub async fn enrich_page(&self, page: &PageRecord) -> Result<EnrichedPageRecord, ClassifyError> {
        tracing::info!("Enriching page: {}", page.title);

        let combined = combine_content(page, self.config.max_referenced_links);
        let content = clip(&combined, self.config.extract_max_chars);
        let extraction = self.classifier.extract(&page.title, &content).await?;

        let sections = if self.config.label_sections {
            self.label_sections(&page.sections).await
        } else {
            Vec::new()
        };

        let summary = if extraction.summary.is_empty() {
            page.summary.clone()
        } else {
            extraction.summary
        };

        Ok(EnrichedPageRecord {
            url: page.url.clone(),
            title: page.title.clone(),
            content_type: extraction.content_type,
            summary,
            structured_fields: extraction.fields,
            parent_url: page.parent_url.clone(),
            depth: page.depth,
            sections,
        })
    }

    /// Enriches every page, batch by batch
    ///
    /// # Returns
    ///
    /// Enriched records in input order, minus the pages whose
    /// classification failed
    pub async fn enrich_all(&self, pages: &[PageRecord]) -> Vec<EnrichedPageRecord> {
        let batch_size = self.config.batch_size.max(1);
        let batch_count = pages.len().div_ceil(batch_size);
        tracing::info!("Enriching {} pages (batch size: {})", pages.len(), batch_size);

        let mut enriched = Vec::with_capacity(pages.len());

        for (i, batch) in pages.chunks(batch_size).enumerate() {
            tracing::info!("Processing batch {}/{}", i + 1, batch_count);

            let results = join_all(batch.iter().map(|page| self.enrich_page(page))).await;
            for (page, result) in batch.iter().zip(results) {
                match result {
                    Ok(record) => enriched.push(record),
                    Err(e) => tracing::error!("Failed to enrich {}: {}", page.url, e),
                }
            }

            if i + 1 < batch_count && !self.config.batch_pause().is_zero() {
                tokio::time::sleep(self.config.batch_pause()).await;
            }
        }

        tracing::info!(
            "Successfully enriched {}/{} pages",
            enriched.len(),
            pages.len()
        );
        enriched
    }

    /// Merges enriched pages into one structure
    ///
    /// Makes a single classifier call, and only when `enabled` is set and
    /// more than one page was enriched. A failed call yields an empty map.
    pub async fn synthesize(&self, enriched: &[EnrichedPageRecord], enabled: bool) -> Map<String, Value> {
        if !enabled {
            tracing::info!("Final synthesis disabled");
            return Map::new();
        }
        if enriched.len() <= 1 {
            tracing::info!("Skipping synthesis ({} enriched page)", enriched.len());
            return Map::new();
        }

        tracing::info!("Synthesizing {} pages into final result", enriched.len());
        match self.classifier.synthesize(enriched).await {
            Ok(fields) => {
                tracing::info!("Synthesis complete ({} top-level fields)", fields.len());
                fields
            }
            Err(e) => {
                tracing::error!("Synthesis failed: {}", e);
                Map::new()
            }
        }
    }

    /// Labels each section with a canonical label
    ///
    /// Only the first `label_max_chars` characters of each section are sent.
    /// A section whose call fails is labelled `other`.
    pub async fn label_sections(&self, sections: &[Section]) -> Vec<LabelledSection> {
        let mut labelled = Vec::with_capacity(sections.len());

        for section in sections {
            let excerpt = truncate_chars(&section.content, self.config.label_max_chars);
            let label = match self.classifier.classify(&section.title, excerpt).await {
                Ok(label) => label,
                Err(e) => {
                    tracing::warn!("Failed to label section '{}': {}", section.title, e);
                    FALLBACK_LABEL.to_string()
                }
            };
            tracing::debug!("Section '{}' labelled {}", section.title, label);

            labelled.push(LabelledSection {
                title: section.title.clone(),
                label,
                content: section.content.clone(),
            });
        }

        labelled
    }
}
