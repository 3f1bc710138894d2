//! HTTP classifier backed by a hosted language model
//!
//! Two wire formats are spoken:
//!
//! | Provider | Endpoint | Auth header |
//! |----------|----------|-------------|
//! | `anthropic` | `{base}/v1/messages` | `x-api-key` |
//! | `openai` | `{base}/v1/chat/completions` | `Authorization: Bearer` |
//! | `azure` | `{base}/openai/deployments/{deployment}/chat/completions` | `api-key` |

use crate::config::{ClassifierConfig, Provider};
use crate::enrich::classifier::{
    normalize_label, parse_json_response, Classifier, ClassifyError, Extraction,
};
use crate::enrich::prompts::{extraction_prompt, label_prompt, synthesis_prompt};
use crate::enrich::EnrichedPageRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

const ANTHROPIC_BASE: &str = "https://api.anthropic.com";
const OPENAI_BASE: &str = "https://api.openai.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A label is one word; keep the completion short
const LABEL_MAX_TOKENS: u32 = 50;

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_completion_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Classifier calling the Anthropic Messages API or an OpenAI-compatible chat API
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    client: Client,
    config: ClassifierConfig,
    api_key: String,
    url: String,
}

impl LlmClassifier {
    /// Creates a classifier for the configured provider
    ///
    /// # Arguments
    ///
    /// * `config` - Provider, model and endpoint settings
    /// * `api_key` - Secret for the provider's API
    ///
    /// # Returns
    ///
    /// * `Ok(LlmClassifier)` - Ready to use
    /// * `Err(ClassifyError)` - Azure settings incomplete, or the HTTP client failed to build
    pub fn new(config: &ClassifierConfig, api_key: impl Into<String>) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(client, config, api_key)
    }

    /// Creates a classifier around an existing HTTP client
    pub fn with_client(
        client: Client,
        config: &ClassifierConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, ClassifyError> {
        let url = endpoint_url(config)?;
        tracing::info!(
            "Classifier: {} model {} at {}",
            config.provider,
            config.model,
            url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
            url,
        })
    }

    /// Sends one prompt and returns the model's text
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ClassifyError> {
        let messages = vec![Message {
            role: "user",
            content: prompt,
        }];

        let request = match self.config.provider {
            Provider::Anthropic => self
                .client
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest {
                    model: &self.config.model,
                    max_tokens,
                    temperature: self.config.temperature,
                    messages,
                }),
            Provider::OpenAi => self.client.post(&self.url).bearer_auth(&self.api_key).json(
                &ChatRequest {
                    model: Some(&self.config.model),
                    temperature: self.config.temperature,
                    max_completion_tokens: max_tokens,
                    messages,
                },
            ),
            Provider::Azure => self
                .client
                .post(&self.url)
                .query(&[("api-version", self.config.azure_api_version.as_str())])
                .header("api-key", &self.api_key)
                .json(&ChatRequest {
                    model: None,
                    temperature: self.config.temperature,
                    max_completion_tokens: max_tokens,
                    messages,
                }),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                message: crate::extract::truncate_chars(body.trim(), 300).to_string(),
            });
        }

        let text = match self.config.provider {
            Provider::Anthropic => {
                let parsed: AnthropicResponse = response
                    .json()
                    .await
                    .map_err(|e| ClassifyError::Response(e.to_string()))?;
                parsed
                    .content
                    .into_iter()
                    .filter(|block| block.kind == "text")
                    .map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join("")
            }
            Provider::OpenAi | Provider::Azure => {
                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| ClassifyError::Response(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| ClassifyError::Response("no choices in response".to_string()))?
            }
        };

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, title: &str, excerpt: &str) -> Result<String, ClassifyError> {
        let answer = self
            .complete(&label_prompt(title, excerpt), LABEL_MAX_TOKENS)
            .await?;
        let label = normalize_label(&answer);
        if label != answer.to_lowercase() {
            tracing::debug!("Label {:?} for '{}' mapped to {}", answer, title, label);
        }
        Ok(label.to_string())
    }

    async fn extract(&self, title: &str, content: &str) -> Result<Extraction, ClassifyError> {
        let answer = self
            .complete(&extraction_prompt(title, content), self.config.max_tokens)
            .await?;
        Ok(match parse_json_response(&answer) {
            Some(value) => Extraction::from_value(value),
            None => {
                tracing::warn!("Unreadable extraction for '{}', using defaults", title);
                Extraction::unknown()
            }
        })
    }

    async fn synthesize(
        &self,
        pages: &[EnrichedPageRecord],
    ) -> Result<Map<String, Value>, ClassifyError> {
        let answer = self
            .complete(
                &synthesis_prompt(pages),
                self.config.max_tokens.saturating_mul(2),
            )
            .await?;
        Ok(match parse_json_response(&answer) {
            Some(Value::Object(fields)) => fields,
            _ => {
                tracing::warn!("Unreadable synthesis of {} pages, using empty result", pages.len());
                Map::new()
            }
        })
    }
}

/// Full request URL for the configured provider
fn endpoint_url(config: &ClassifierConfig) -> Result<String, ClassifyError> {
    let base = config.endpoint.as_deref().map(|e| e.trim_end_matches('/'));

    match config.provider {
        Provider::Anthropic => Ok(format!("{}/v1/messages", base.unwrap_or(ANTHROPIC_BASE))),
        Provider::OpenAi => Ok(format!("{}/v1/chat/completions", base.unwrap_or(OPENAI_BASE))),
        Provider::Azure => {
            let base = base.ok_or_else(|| {
                ClassifyError::Config("azure provider requires an endpoint".to_string())
            })?;
            let deployment = config.azure_deployment.as_deref().unwrap_or(&config.model);
            Ok(format!(
                "{}/openai/deployments/{}/chat/completions",
                base, deployment
            ))
        }
    }
}
