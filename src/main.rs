//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use site_harvest::config::{load_config_with_hash, resolve_api_key, Config};
use site_harvest::crawler::{run_job, HttpRenderer, RunOptions};
use site_harvest::enrich::LlmClassifier;
use site_harvest::output::{print_statistics, CrawlStatistics};
use site_harvest::state::StateStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: a resumable site crawler with content enrichment
///
/// Site-Harvest crawls a website breadth-first from the job's start URL,
/// extracts titled content from every page, and classifies the result with
/// a hosted language model. Interrupted crawls resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "A resumable site crawler with content enrichment", long_about = None)]
struct Cli {
    /// Path to the TOML job file
    #[arg(value_name = "JOB")]
    job: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Forget saved crawl state and start over
    #[arg(long, conflicts_with_all = ["dry_run", "state"])]
    fresh: bool,

    /// Crawl only; write raw pages without classification
    #[arg(long)]
    skip_enrichment: bool,

    /// Validate the job file and show what would be crawled without crawling
    #[arg(long, conflicts_with = "state")]
    dry_run: bool,

    /// Show the saved crawl state of the job and exit
    #[arg(long, conflicts_with = "dry_run")]
    state: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate the job file
    tracing::info!("Loading job from: {}", cli.job.display());
    let (config, config_hash) = load_config_with_hash(&cli.job)
        .with_context(|| format!("Failed to load job file {}", cli.job.display()))?;
    tracing::info!("Job loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.state {
        handle_state(&config)
    } else {
        handle_crawl(config, config_hash, cli.fresh, cli.skip_enrichment).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates the job and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let job = &config.job;
    println!("=== Site-Harvest Dry Run ===\n");

    println!("Job:");
    println!("  Name: {}", job.job_name);
    println!("  Start URL: {}", job.start_url);
    println!("  Max depth: {}", job.max_depth);
    println!("  Max pages: {}", job.max_pages);
    println!("  Link filter: {}", job.link_filter);
    println!("  Follow all links: {}", job.follow_all_links);
    println!("  Expand interactive: {}", job.expand_interactive);
    if let Some(selector) = &job.content_area_selector {
        println!("  Content area: {}", selector);
    }

    println!("\nCrawler:");
    println!(
        "  Delay between pages: {:.1}-{:.1}s",
        config.crawler.min_delay_secs, config.crawler.max_delay_secs
    );
    println!(
        "  Retries: {} attempts, {:.1}s apart",
        config.crawler.retry_attempts, config.crawler.retry_delay_secs
    );
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nEnrichment:");
    if config.enrichment.enabled {
        println!(
            "  Provider: {} ({})",
            config.classifier.provider, config.classifier.model
        );
        println!("  Batch size: {}", config.enrichment.batch_size);
        println!("  API key variable: {}", config.classifier.api_key_env);
        println!("  Final synthesis: {}", job.final_synthesis);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Job directory: {}", config.job_dir().display());
    println!("  State directory: {}", config.output.state_dir);
    println!("  Summary: {}", config.summary_path().display());

    let store = StateStore::open(&config.output.state_dir, &job.job_name);
    let state = store.snapshot();

    println!("\n✓ Job file is valid");
    if state.visited.is_empty() {
        println!("✓ Would start a new crawl at {}", job.start_url);
    } else {
        println!(
            "✓ Would resume: {} visited, {} queued (use --fresh to start over)",
            state.visited.len(),
            state.queued.len()
        );
    }

    Ok(())
}

/// Handles the --state mode: shows the saved crawl state
fn handle_state(config: &Config) -> anyhow::Result<()> {
    let store = StateStore::open(&config.output.state_dir, &config.job.job_name);
    println!("State file: {}\n", store.path().display());

    let stats = CrawlStatistics::from_state(&store.snapshot());
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
    skip_enrichment: bool,
) -> anyhow::Result<()> {
    let renderer = HttpRenderer::new(&config.crawler).context("Failed to build HTTP client")?;

    let classifier = if config.enrichment.enabled && !skip_enrichment {
        let api_key = resolve_api_key(&config)?;
        Some(LlmClassifier::new(&config.classifier, api_key)?)
    } else {
        None
    };

    let options = RunOptions {
        fresh,
        skip_enrichment,
    };

    match run_job(&config, Some(&config_hash), renderer, classifier, options).await {
        Ok(Some(result)) => {
            tracing::info!(
                "Job completed: {} pages, {} enriched, {} failed",
                result.metadata.total_pages,
                result.metadata.successful_enrichments,
                result.metadata.failed
            );
            println!("✓ Results written to {}", config.job_dir().display());
            Ok(())
        }
        Ok(None) => {
            tracing::info!("Crawl completed without enrichment");
            println!("✓ Raw pages written to {}", config.job_dir().display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Job failed: {}", e);
            Err(e.into())
        }
    }
}
