//! Fakes shared by the integration tests

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use site_harvest::config::{parse_config, Config};
use site_harvest::crawler::{RenderError, Renderer};
use site_harvest::enrich::{Classifier, ClassifyError, EnrichedPageRecord, Extraction};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use url::Url;

/// An in-memory site; unknown URLs answer 404
#[derive(Clone, Default)]
pub struct FakeSite {
    pages: Arc<HashMap<String, String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSite {
    pub fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
            ),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// URLs rendered so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeSite {
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| RenderError::Http {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// Classifier answering from the page title; titles containing "broken" fail
#[derive(Clone, Default)]
pub struct TitleClassifier {
    pub synthesis_calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl Classifier for TitleClassifier {
    async fn classify(&self, _title: &str, _excerpt: &str) -> Result<String, ClassifyError> {
        Ok("overview".to_string())
    }

    async fn extract(&self, title: &str, content: &str) -> Result<Extraction, ClassifyError> {
        if title.to_lowercase().contains("broken") {
            return Err(ClassifyError::Api {
                status: 500,
                message: "upstream failure".to_string(),
            });
        }

        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("length".to_string(), json!(content.len()));
        Ok(Extraction {
            content_type: "page".to_string(),
            summary: format!("About {}", title),
            fields,
        })
    }

    async fn synthesize(
        &self,
        pages: &[EnrichedPageRecord],
    ) -> Result<Map<String, Value>, ClassifyError> {
        *self.synthesis_calls.lock().unwrap() += 1;
        let mut fields = Map::new();
        fields.insert("page_count".to_string(), json!(pages.len()));
        Ok(fields)
    }
}

/// A content page linking to `links`
pub fn page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<li><a href=\"{}\">{}</a></li>", href, href))
        .collect();
    format!(
        "<html><head><title>{title}</title></head><body>\
         <main><h1>{title}</h1>\
         <p>This page describes {title} in enough words to count as content.</p>\
         <ul>{anchors}</ul></main></body></html>"
    )
}

/// A job file crawling `start_url` with no pauses, writing under `dir`
pub fn job_config(dir: &Path, start_url: &str, extra_job: &str) -> Config {
    let toml = format!(
        r#"
[job]
job-name = "integration"
start-url = "{start_url}"
follow-all-links = true
{extra_job}

[crawler]
min-delay-secs = 0.0
max-delay-secs = 0.0
retry-delay-secs = 0.0

[enrichment]
batch-size = 2
batch-pause-ms = 0

[output]
data-dir = "{data}"
state-dir = "{state}"
"#,
        data = dir.join("data").display(),
        state = dir.join("state").display(),
    );
    parse_config(&toml).expect("test job file is valid")
}
