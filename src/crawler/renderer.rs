//! Page rendering
//!
//! The crawler asks a [`Renderer`] for the HTML of one URL at a time. The
//! crate ships [`HttpRenderer`], which fetches server-rendered markup over
//! HTTP; browser-driven implementations plug in behind the same trait.
//!
//! Error classification decides what the retry wrapper does:
//!
//! | Condition | Retried |
//! |-----------|---------|
//! | Timeout | yes |
//! | Connection failure | yes |
//! | HTTP 5xx | yes |
//! | HTTP 4xx | no |
//! | Non-HTML body | no |

use crate::config::CrawlerConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Why a page could not be rendered
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Not an HTML page ({content_type})")]
    NotHtml { content_type: String },

    #[error("Renderer error: {0}")]
    Other(String),
}

impl RenderError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::NotHtml { .. } | Self::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for RenderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() || e.is_request() || e.is_body() {
            Self::Network(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Produces the final HTML of a page
///
/// Implementations handle navigation and any client-side expansion; the
/// crawler only sees the resulting markup.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `url` and returns its HTML
    async fn render(&self, url: &Url) -> Result<String, RenderError>;
}

/// Builds the HTTP client used for page renders
///
/// # Arguments
///
/// * `config` - Crawler settings (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```
/// use site_harvest::config::CrawlerConfig;
/// use site_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renders pages with a plain HTTP GET
///
/// Redirects are followed. The body is returned when the response is a
/// success with an HTML (or missing) `Content-Type`.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Creates a renderer with a client built from `config`
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Creates a renderer around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Http {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(RenderError::NotHtml { content_type });
        }

        Ok(response.text().await?)
    }
}

/// True for HTML content types, and for responses without one
fn is_html(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}
