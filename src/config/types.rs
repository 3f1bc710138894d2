use crate::url::{sanitize_component, LinkFilter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete job file: what to crawl plus how to crawl, enrich and store it
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub job: CrawlJob,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Filesystem-safe form of the job name, used for state and output paths
    pub fn job_slug(&self) -> String {
        self.job.slug()
    }

    /// Directory holding every artifact of this job
    pub fn job_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.data_dir).join(self.job_slug())
    }

    /// Path of the Markdown run summary
    pub fn summary_path(&self) -> PathBuf {
        match &self.output.summary_path {
            Some(path) => PathBuf::from(path),
            None => self.job_dir().join("summary.md"),
        }
    }
}

/// What to crawl; immutable once a run starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlJob {
    /// Unique name; keys the persisted crawl state
    #[serde(rename = "job-name")]
    pub job_name: String,

    /// Seed URL, crawled at depth 0
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Deepest link level to crawl (0 = seed only)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Upper bound on recorded pages
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Which discovered links are admissible
    #[serde(rename = "link-filter", default)]
    pub link_filter: LinkFilter,

    /// Follow every admissible link rather than only navigation links
    #[serde(rename = "follow-all-links", default)]
    pub follow_all_links: bool,

    /// Read accordion, details and tab panel content
    #[serde(rename = "expand-interactive", default = "default_true")]
    pub expand_interactive: bool,

    /// CSS selector restricting extraction to one subtree
    #[serde(rename = "content-area-selector", default)]
    pub content_area_selector: Option<String>,

    /// Write one JSON file per enriched page
    #[serde(rename = "save-individual-pages", default = "default_true")]
    pub save_individual_pages: bool,

    /// Run the cross-page synthesis call after enrichment
    #[serde(rename = "final-synthesis", default = "default_true")]
    pub final_synthesis: bool,
}

impl CrawlJob {
    /// Creates a job with default bounds and options
    pub fn new(job_name: impl Into<String>, start_url: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            start_url: start_url.into(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            link_filter: LinkFilter::default(),
            follow_all_links: false,
            expand_interactive: true,
            content_area_selector: None,
            save_individual_pages: true,
            final_synthesis: true,
        }
    }

    /// Filesystem-safe form of the job name
    pub fn slug(&self) -> String {
        let slug = sanitize_component(&self.job_name);
        if slug.is_empty() {
            "job".to_string()
        } else {
            slug
        }
    }
}

/// Crawl pacing, retries and HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Lower bound of the random pause between page renders (seconds)
    #[serde(rename = "min-delay-secs", default = "default_min_delay")]
    pub min_delay_secs: f64,

    /// Upper bound of the random pause between page renders (seconds)
    #[serde(rename = "max-delay-secs", default = "default_max_delay")]
    pub max_delay_secs: f64,

    /// Render attempts per URL, the first one included
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed wait between render attempts (seconds)
    #[serde(rename = "retry-delay-secs", default = "default_retry_delay")]
    pub retry_delay_secs: f64,

    /// Whole-request timeout for page renders (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout for page renders (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every render
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Batching of classifier calls
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Run enrichment after the crawl
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pages classified concurrently per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (milliseconds)
    #[serde(rename = "batch-pause-ms", default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Characters of page text sent for extraction
    #[serde(rename = "extract-max-chars", default = "default_extract_max_chars")]
    pub extract_max_chars: usize,

    /// Characters of section text sent for labelling
    #[serde(rename = "label-max-chars", default = "default_label_max_chars")]
    pub label_max_chars: usize,

    /// Referenced links appended to the page text
    #[serde(rename = "max-referenced-links", default = "default_max_referenced_links")]
    pub max_referenced_links: usize,

    /// Label each detail-page section with a canonical label (one call per section)
    #[serde(rename = "label-sections", default)]
    pub label_sections: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            extract_max_chars: default_extract_max_chars(),
            label_max_chars: default_label_max_chars(),
            max_referenced_links: default_max_referenced_links(),
            label_sections: false,
        }
    }
}

impl EnrichmentConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Which text-understanding service to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// OpenAI Chat Completions
    OpenAi,
    /// Azure OpenAI deployment (Chat Completions wire format)
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier service settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Base URL override; for Azure, the resource endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_classifier_timeout")]
    pub timeout_secs: u64,

    /// Azure deployment name; defaults to the model name
    #[serde(rename = "azure-deployment", default)]
    pub azure_deployment: Option<String>,

    #[serde(rename = "azure-api-version", default = "default_azure_api_version")]
    pub azure_api_version: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            endpoint: None,
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_classifier_timeout(),
            azure_deployment: None,
            azure_api_version: default_azure_api_version(),
        }
    }
}

/// Where artifacts and crawl state are written
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for per-job artifacts
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,

    /// Directory for crawl state files
    #[serde(rename = "state-dir", default = "default_state_dir")]
    pub state_dir: String,

    /// Markdown summary path; defaults to `<data-dir>/<job>/summary.md`
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            state_dir: default_state_dir(),
            summary_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    1
}

fn default_max_pages() -> usize {
    50
}

fn default_min_delay() -> f64 {
    3.0
}

fn default_max_delay() -> f64 {
    6.0
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay() -> f64 {
    3.0
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; SiteHarvest/{})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    1000
}

fn default_extract_max_chars() -> usize {
    6000
}

fn default_label_max_chars() -> usize {
    300
}

fn default_max_referenced_links() -> usize {
    10
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_classifier_timeout() -> u64 {
    120
}

fn default_azure_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_state_dir() -> String {
    "data/state".to_string()
}
