//! End-to-end crawl tests over an in-memory site

use crate::common::{job_config, page, FakeSite, TitleClassifier};
use site_harvest::config::{CrawlJob, CrawlerConfig};
use site_harvest::crawler::{run_job, Orchestrator, RunOptions};
use site_harvest::enrich::{CrawlResult, LlmClassifier};
use site_harvest::output::ArtifactWriter;
use site_harvest::state::StateStore;
use tempfile::TempDir;

const SEED: &str = "https://example.com/docs/";

fn fast_crawler() -> CrawlerConfig {
    CrawlerConfig {
        min_delay_secs: 0.0,
        max_delay_secs: 0.0,
        retry_delay_secs: 0.0,
        ..CrawlerConfig::default()
    }
}

fn job(max_depth: u32, max_pages: usize) -> CrawlJob {
    let mut job = CrawlJob::new("docs", SEED);
    job.max_depth = max_depth;
    job.max_pages = max_pages;
    job.follow_all_links = true;
    job
}

/// Seed linking to five children, one of which links one level deeper
fn docs_site() -> FakeSite {
    FakeSite::new(&[
        (
            SEED,
            page("Docs", &["/docs/a", "/docs/b", "/docs/c", "/docs/d", "/docs/e"]),
        ),
        ("https://example.com/docs/a", page("A", &["/docs/a/deep", "/docs/"])),
        ("https://example.com/docs/b", page("B", &[])),
        ("https://example.com/docs/c", page("C", &[])),
        ("https://example.com/docs/d", page("D", &[])),
        ("https://example.com/docs/e", page("E", &[])),
        ("https://example.com/docs/a/deep", page("Deep", &[])),
    ])
}

#[tokio::test]
async fn test_max_pages_stops_crawl_and_persists_queue() {
    let dir = TempDir::new().unwrap();
    let site = docs_site();
    let store = StateStore::open(dir.path(), "docs");

    let mut orchestrator = Orchestrator::new(job(2, 3), fast_crawler(), site.clone(), store).unwrap();
    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(site.calls().len(), 3);
    assert!(orchestrator.frontier().check_invariants().is_ok());

    let state = orchestrator.store().snapshot();
    assert_eq!(state.visited.len(), 3);
    assert!(!state.queued.is_empty());
    assert!(state.is_consistent());

    let reloaded = StateStore::load(orchestrator.store().path()).unwrap().unwrap();
    assert_eq!(reloaded.visited, state.visited);
}

#[tokio::test]
async fn test_breadth_first_order_and_depth_bound() {
    let dir = TempDir::new().unwrap();
    let site = docs_site();
    let store = StateStore::open(dir.path(), "docs");

    let mut orchestrator = Orchestrator::new(job(1, 50), fast_crawler(), site.clone(), store).unwrap();
    let outcome = orchestrator.run().await.unwrap();

    let urls: Vec<_> = outcome.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://example.com/docs/",
            "https://example.com/docs/a",
            "https://example.com/docs/b",
            "https://example.com/docs/c",
            "https://example.com/docs/d",
            "https://example.com/docs/e",
        ]
    );

    // Too deep to render, but still reported as discovered
    assert!(!site.calls().contains(&"https://example.com/docs/a/deep".to_string()));
    let a = &outcome.pages[1];
    assert!(a
        .discovered_links
        .contains(&"https://example.com/docs/a/deep".to_string()));
    assert_eq!(a.parent_url.as_deref(), Some(SEED));
    assert!(outcome.pages.iter().all(|p| p.depth <= 1));

    // The back-link to the seed is never rendered twice
    assert_eq!(site.calls().iter().filter(|u| u.as_str() == SEED).count(), 1);
}

#[tokio::test]
async fn test_resume_does_not_render_visited_pages_again() {
    let dir = TempDir::new().unwrap();

    let first = docs_site();
    let store = StateStore::open(dir.path(), "docs");
    let mut orchestrator = Orchestrator::new(job(1, 2), fast_crawler(), first.clone(), store).unwrap();
    orchestrator.run().await.unwrap();
    assert_eq!(
        first.calls(),
        vec![SEED.to_string(), "https://example.com/docs/a".to_string()]
    );

    let second = docs_site();
    let store = StateStore::open(dir.path(), "docs");
    let mut orchestrator = Orchestrator::new(job(1, 50), fast_crawler(), second.clone(), store).unwrap();
    let outcome = orchestrator.run().await.unwrap();

    let calls = second.calls();
    assert!(!calls.contains(&SEED.to_string()));
    assert!(!calls.contains(&"https://example.com/docs/a".to_string()));
    assert_eq!(outcome.pages.len(), 4);
    assert!(outcome.skipped.iter().any(|u| u.as_str() == SEED));
    assert!(orchestrator.frontier().check_invariants().is_ok());
}

#[tokio::test]
async fn test_failed_page_is_retried_when_rediscovered() {
    let dir = TempDir::new().unwrap();
    let missing = "https://example.com/docs/gone";

    let broken = FakeSite::new(&[
        (SEED, page("Docs", &["/docs/gone", "/docs/b", "/docs/a"])),
        ("https://example.com/docs/a", page("A", &["/docs/gone"])),
        ("https://example.com/docs/b", page("B", &[])),
    ]);
    let store = StateStore::open(dir.path(), "docs");
    let mut orchestrator = Orchestrator::new(job(2, 2), fast_crawler(), broken.clone(), store).unwrap();
    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    // 404 is not retryable: one render only
    assert_eq!(broken.calls().iter().filter(|u| u.as_str() == missing).count(), 1);
    assert!(orchestrator.store().is_failed(missing));
    assert!(!orchestrator.store().is_visited(missing));

    let fixed = FakeSite::new(&[
        (SEED, page("Docs", &["/docs/gone", "/docs/b", "/docs/a"])),
        ("https://example.com/docs/a", page("A", &["/docs/gone"])),
        ("https://example.com/docs/b", page("B", &[])),
        (missing, page("Back again", &[])),
    ]);
    let store = StateStore::open(dir.path(), "docs");
    let mut orchestrator = Orchestrator::new(job(2, 50), fast_crawler(), fixed.clone(), store).unwrap();
    let outcome = orchestrator.run().await.unwrap();

    assert_eq!(
        fixed.calls(),
        vec!["https://example.com/docs/a".to_string(), missing.to_string()]
    );
    assert!(outcome.failed.is_empty());
    let recovered = outcome.pages.iter().find(|p| p.url == missing).unwrap();
    assert_eq!(recovered.depth, 2);
    assert!(orchestrator.store().is_visited(missing));
    assert!(!orchestrator.store().is_failed(missing));
}

#[tokio::test]
async fn test_run_job_writes_all_artifacts() {
    let dir = TempDir::new().unwrap();
    let site = docs_site();
    let config = job_config(dir.path(), SEED, "max-depth = 1");
    let classifier = TitleClassifier::default();

    let result = run_job(
        &config,
        Some("hash-1"),
        site,
        Some(classifier.clone()),
        RunOptions::default(),
    )
    .await
    .unwrap()
    .expect("enrichment ran");

    assert_eq!(result.job_name, "integration");
    assert_eq!(result.metadata.total_pages, 6);
    assert_eq!(result.metadata.successful_enrichments, 6);
    assert_eq!(result.main_page.as_ref().map(|p| p.depth), Some(0));
    assert_eq!(result.child_pages.len(), 5);
    assert_eq!(result.synthesized_fields.get("page_count"), Some(&serde_json::json!(6)));
    assert_eq!(*classifier.synthesis_calls.lock().unwrap(), 1);

    let job_dir = config.job_dir();
    let saved: CrawlResult =
        serde_json::from_str(&std::fs::read_to_string(job_dir.join("final_result.json")).unwrap())
            .unwrap();
    assert_eq!(saved.child_pages.len(), 5);

    assert_eq!(std::fs::read_dir(job_dir.join("raw_pages")).unwrap().count(), 6);
    assert_eq!(std::fs::read_dir(job_dir.join("enriched_pages")).unwrap().count(), 6);

    let summary = std::fs::read_to_string(config.summary_path()).unwrap();
    assert!(summary.contains("# Site-Harvest Summary: integration"));
    assert!(summary.contains("| page | 6 |"));

    let store = StateStore::open(&config.output.state_dir, &config.job.job_name);
    assert_eq!(store.config_hash(), Some("hash-1"));
}

#[tokio::test]
async fn test_run_job_skip_enrichment_writes_raw_pages_only() {
    let dir = TempDir::new().unwrap();
    let config = job_config(dir.path(), SEED, "max-depth = 0");

    let result = run_job(
        &config,
        None,
        docs_site(),
        None::<LlmClassifier>,
        RunOptions {
            fresh: false,
            skip_enrichment: true,
        },
    )
    .await
    .unwrap();

    assert!(result.is_none());
    let job_dir = config.job_dir();
    assert_eq!(std::fs::read_dir(job_dir.join("raw_pages")).unwrap().count(), 1);
    assert!(!job_dir.join("final_result.json").exists());
    assert!(config.summary_path().exists());
}

#[tokio::test]
async fn test_resumed_job_merges_earlier_pages() {
    let dir = TempDir::new().unwrap();
    let config = job_config(dir.path(), SEED, "max-depth = 1\nmax-pages = 2");
    let skip = RunOptions {
        fresh: false,
        skip_enrichment: true,
    };

    run_job(&config, None, docs_site(), None::<LlmClassifier>, skip)
        .await
        .unwrap();

    let mut resumed = config.clone();
    resumed.job.max_pages = 50;
    let site = docs_site();
    let result = run_job(
        &resumed,
        None,
        site.clone(),
        Some(TitleClassifier::default()),
        RunOptions::default(),
    )
    .await
    .unwrap()
    .expect("enrichment ran");

    assert!(!site.calls().contains(&SEED.to_string()));
    assert_eq!(result.metadata.total_pages, 6);
    assert_eq!(result.metadata.visited, 6);
    assert_eq!(result.main_page.as_ref().map(|p| p.url.as_str()), Some(SEED));
}

#[tokio::test]
async fn test_resumed_job_keeps_page_limit() {
    let dir = TempDir::new().unwrap();
    let config = job_config(dir.path(), SEED, "max-depth = 1\nmax-pages = 2");
    let skip = RunOptions {
        fresh: false,
        skip_enrichment: true,
    };

    let first = docs_site();
    run_job(&config, None, first.clone(), None::<LlmClassifier>, skip)
        .await
        .unwrap();
    assert_eq!(first.calls().len(), 2);

    let second = docs_site();
    let result = run_job(
        &config,
        None,
        second.clone(),
        Some(TitleClassifier::default()),
        RunOptions::default(),
    )
    .await
    .unwrap()
    .expect("enrichment ran");

    assert!(second.calls().is_empty());
    assert_eq!(result.metadata.total_pages, 2);
    assert_eq!(result.metadata.successful_enrichments, 2);
    assert_eq!(result.metadata.visited, 2);

    // A raised limit continues with the remaining budget only
    let mut raised = config.clone();
    raised.job.max_pages = 4;
    let third = docs_site();
    let result = run_job(
        &raised,
        None,
        third.clone(),
        Some(TitleClassifier::default()),
        RunOptions::default(),
    )
    .await
    .unwrap()
    .expect("enrichment ran");

    assert_eq!(
        third.calls(),
        vec![
            "https://example.com/docs/b".to_string(),
            "https://example.com/docs/c".to_string()
        ]
    );
    assert_eq!(result.metadata.total_pages, 4);
    assert_eq!(result.metadata.visited, 4);
}

#[tokio::test]
async fn test_recorded_pages_saved_during_crawl() {
    let dir = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(dir.path().join("job"));
    let store = StateStore::open(dir.path().join("state"), "docs");

    let mut orchestrator = Orchestrator::new(job(1, 3), fast_crawler(), docs_site(), store)
        .unwrap()
        .with_prior_pages(1)
        .with_artifacts(writer.clone());
    let outcome = orchestrator.run().await.unwrap();

    // One page of the limit belongs to an earlier run
    assert_eq!(outcome.pages.len(), 2);

    let saved = writer.load_raw_pages().unwrap();
    let urls: Vec<_> = saved.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec![SEED, "https://example.com/docs/a"]);
    let names: Vec<_> = std::fs::read_dir(writer.raw_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("page_002_")));
    assert!(names.iter().any(|n| n.starts_with("page_003_")));
}

#[tokio::test]
async fn test_fresh_run_forgets_previous_state() {
    let dir = TempDir::new().unwrap();
    let config = job_config(dir.path(), SEED, "max-depth = 0");
    let skip = RunOptions {
        fresh: false,
        skip_enrichment: true,
    };

    run_job(&config, None, docs_site(), None::<LlmClassifier>, skip)
        .await
        .unwrap();

    let again = docs_site();
    run_job(&config, None, again.clone(), None::<LlmClassifier>, skip)
        .await
        .unwrap();
    assert!(again.calls().is_empty());

    let fresh = docs_site();
    run_job(
        &config,
        None,
        fresh.clone(),
        None::<LlmClassifier>,
        RunOptions {
            fresh: true,
            skip_enrichment: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(fresh.calls(), vec![SEED.to_string()]);
}
