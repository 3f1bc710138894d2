//! Enrichment pipeline tests with a fake classifier

use crate::common::TitleClassifier;
use chrono::Utc;
use site_harvest::config::{CrawlJob, EnrichmentConfig};
use site_harvest::crawler::{CrawlOutcome, PageRecord};
use site_harvest::enrich::{CrawlResult, Enricher};
use site_harvest::state::CrawlState;
use std::time::Duration;
use url::Url;

fn record(path: &str, title: &str, depth: u32) -> PageRecord {
    PageRecord {
        url: format!("https://example.com{}", path),
        title: title.to_string(),
        main_content: format!("{} explains the process step by step.", title),
        interactive_sections: Vec::new(),
        referenced_links: Vec::new(),
        discovered_links: Vec::new(),
        parent_url: (depth > 0).then(|| "https://example.com/".to_string()),
        depth,
        fetched_at: Utc::now(),
        summary: String::new(),
        sections: Vec::new(),
    }
}

fn enricher(classifier: TitleClassifier) -> Enricher<TitleClassifier> {
    Enricher::new(
        classifier,
        EnrichmentConfig {
            batch_size: 2,
            batch_pause_ms: 0,
            ..EnrichmentConfig::default()
        },
    )
}

fn outcome(pages: &[PageRecord], failed: &[&str]) -> CrawlOutcome {
    CrawlOutcome {
        pages: pages.to_vec(),
        visited: pages.iter().map(|p| Url::parse(&p.url).unwrap()).collect(),
        failed: failed.iter().map(|u| Url::parse(u).unwrap()).collect(),
        skipped: Vec::new(),
        duration: Duration::from_secs(12),
    }
}

#[tokio::test]
async fn test_failed_extraction_drops_only_that_page() {
    let pages = vec![
        record("/", "Home", 0),
        record("/a", "Apply", 1),
        record("/b", "Broken page", 1),
        record("/c", "Costs", 1),
        record("/d", "Documents", 1),
    ];
    let enricher = enricher(TitleClassifier::default());

    let enriched = enricher.enrich_all(&pages).await;

    let titles: Vec<_> = enriched.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "Apply", "Costs", "Documents"]);
    assert!(enriched.iter().all(|p| p.content_type == "page"));
    assert_eq!(enriched[1].summary, "About Apply");
    assert_eq!(enriched[1].parent_url.as_deref(), Some("https://example.com/"));
}

#[tokio::test]
async fn test_assembled_result_splits_main_and_child_pages() {
    let pages = vec![
        record("/", "Home", 0),
        record("/a", "Apply", 1),
        record("/b", "Broken page", 1),
    ];
    let classifier = TitleClassifier::default();
    let enricher = enricher(classifier.clone());

    let enriched = enricher.enrich_all(&pages).await;
    let synthesized = enricher.synthesize(&enriched, true).await;
    let job = CrawlJob::new("visas", "https://example.com/");
    let mut state = CrawlState::new("visas");
    state.visited.extend(pages.iter().map(|p| p.url.clone()));
    state.failed.insert("https://example.com/gone".to_string());

    let result = CrawlResult::assemble(
        &job,
        &outcome(&pages, &["https://example.com/gone"]),
        &state,
        pages.len(),
        enriched,
        synthesized,
    );

    assert_eq!(result.metadata.total_pages, 3);
    assert_eq!(result.metadata.successful_enrichments, 2);
    assert_eq!(result.metadata.visited, 3);
    assert_eq!(result.metadata.failed_urls, vec!["https://example.com/gone"]);
    assert_eq!(result.main_page.as_ref().map(|p| p.title.as_str()), Some("Home"));
    assert_eq!(result.child_pages.len(), 1);
    assert_eq!(result.synthesized_fields.get("page_count"), Some(&serde_json::json!(2)));
    assert_eq!(*classifier.synthesis_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_synthesis_needs_more_than_one_page() {
    let classifier = TitleClassifier::default();
    let enricher = enricher(classifier.clone());

    let enriched = enricher.enrich_all(&[record("/", "Home", 0)]).await;
    assert!(enricher.synthesize(&enriched, true).await.is_empty());

    let enriched = enricher
        .enrich_all(&[record("/", "Home", 0), record("/a", "Apply", 1)])
        .await;
    assert!(enricher.synthesize(&enriched, false).await.is_empty());

    assert_eq!(*classifier.synthesis_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_section_labels_when_enabled() {
    let mut page = record("/a", "Apply", 1);
    page.sections = vec![site_harvest::extract::Section {
        title: "Eligibility".to_string(),
        content: "Who can apply.".to_string(),
    }];

    let enricher = Enricher::new(
        TitleClassifier::default(),
        EnrichmentConfig {
            label_sections: true,
            batch_pause_ms: 0,
            ..EnrichmentConfig::default()
        },
    );
    let enriched = enricher.enrich_page(&page).await.unwrap();

    assert_eq!(enriched.sections.len(), 1);
    assert_eq!(enriched.sections[0].title, "Eligibility");
    assert_eq!(enriched.sections[0].label, "overview");
}
