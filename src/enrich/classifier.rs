//! The text classifier seam
//!
//! Enrichment talks to a [`Classifier`]: something that labels a short
//! excerpt, pulls structured fields out of a page, and merges many pages
//! into one structure. [`LlmClassifier`](super::LlmClassifier) is the
//! shipped implementation; tests use in-memory fakes.
//!
//! Classifiers must be lenient about what the model returns. A response
//! that is not JSON, or a label outside [`CANONICAL_LABELS`], becomes a
//! default result. Only transport and API failures are errors.

use crate::enrich::EnrichedPageRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Labels a detail-page section can carry
pub const CANONICAL_LABELS: &[&str] = &[
    "overview",
    "eligibility",
    "requirements",
    "costs",
    "processing_times",
    "conditions",
    "how_to_apply",
    "documents",
    "obligations",
    "other",
];

/// Label used when the classifier answers outside the canonical set
pub const FALLBACK_LABEL: &str = "other";

/// Content type used when an extraction response cannot be read
pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Errors talking to the classification service
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    Response(String),

    #[error("Classifier misconfigured: {0}")]
    Config(String),
}

/// Structured reading of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub content_type: String,
    pub summary: String,
    pub fields: Map<String, Value>,
}

impl Extraction {
    /// The result used when a response cannot be interpreted
    pub fn unknown() -> Self {
        Self {
            content_type: UNKNOWN_CONTENT_TYPE.to_string(),
            summary: String::new(),
            fields: Map::new(),
        }
    }

    /// Reads an extraction from a parsed response
    ///
    /// Expects `{"content_type": .., "summary": .., "structured_data": {..}}`.
    /// Missing or mistyped members fall back to their defaults; `fields` is
    /// also accepted in place of `structured_data`.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::unknown();
        };

        let content_type = match object.remove("content_type") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => UNKNOWN_CONTENT_TYPE.to_string(),
        };
        let summary = match object.remove("summary") {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => String::new(),
        };
        let fields = match object
            .remove("structured_data")
            .or_else(|| object.remove("fields"))
        {
            Some(Value::Object(fields)) => fields,
            _ => Map::new(),
        };

        Self {
            content_type,
            summary,
            fields,
        }
    }
}

/// Maps raw text to labels and structure
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Labels a titled excerpt with one of [`CANONICAL_LABELS`]
    async fn classify(&self, title: &str, excerpt: &str) -> Result<String, ClassifyError>;

    /// Extracts content type, summary and structured fields from a page
    async fn extract(&self, title: &str, content: &str) -> Result<Extraction, ClassifyError>;

    /// Merges enriched pages into one structure
    async fn synthesize(
        &self,
        pages: &[EnrichedPageRecord],
    ) -> Result<Map<String, Value>, ClassifyError>;
}

/// Maps a free-form label onto the canonical set
///
/// Case, surrounding punctuation and space/hyphen separators are ignored.
/// Anything still outside the set becomes [`FALLBACK_LABEL`].
///
/// # Examples
///
/// ```
/// use site_harvest::enrich::normalize_label;
///
/// assert_eq!(normalize_label(" How to apply. "), "how_to_apply");
/// assert_eq!(normalize_label("pricing"), "other");
/// ```
pub fn normalize_label(raw: &str) -> &'static str {
    let cleaned: String = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    CANONICAL_LABELS
        .iter()
        .find(|label| **label == cleaned)
        .copied()
        .unwrap_or(FALLBACK_LABEL)
}

/// Parses JSON out of a model response
///
/// Handles bare JSON, JSON inside a ```` ```json ```` or plain ```` ``` ````
/// fence, and JSON surrounded by prose.
///
/// # Returns
///
/// * `Some(value)` - Parsed JSON
/// * `None` - Nothing in the text parses
pub fn parse_json_response(text: &str) -> Option<Value> {
    let text = text.trim();
    let candidate = fenced_block(text).unwrap_or(text);

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    // Prose around an object: try the outermost braces
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&candidate[start..=end]) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                "Could not parse classifier response as JSON: {} ({:?})",
                e,
                crate::extract::truncate_chars(text, 200)
            );
            None
        }
    }
}

/// Contents of the first fenced code block, if any
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip a language tag such as `json`
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let tag = &after[..body_start];
    let body = if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
        &after[body_start..]
    } else {
        after
    };
    let close = body.find("```")?;
    Some(body[..close].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("eligibility"), "eligibility");
        assert_eq!(normalize_label("Processing Times"), "processing_times");
        assert_eq!(normalize_label("\"costs\""), "costs");
        assert_eq!(normalize_label("how-to-apply"), "how_to_apply");
        assert_eq!(normalize_label("nonsense label"), "other");
        assert_eq!(normalize_label(""), "other");
    }

    #[test]
    fn test_parse_bare_json() {
        let value = parse_json_response(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Here you go:\n```json\n{\"content_type\": \"visa\"}\n```\nThanks";
        assert_eq!(parse_json_response(text).unwrap(), json!({"content_type": "visa"}));

        let plain = "```\n[1, 2]\n```";
        assert_eq!(parse_json_response(plain).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_parse_json_in_prose() {
        let text = "The answer is {\"summary\": \"short\"} as requested.";
        assert_eq!(parse_json_response(text).unwrap(), json!({"summary": "short"}));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_json_response("no json here").is_none());
        assert!(parse_json_response("} backwards {").is_none());
    }

    #[test]
    fn test_extraction_from_value() {
        let extraction = Extraction::from_value(json!({
            "content_type": "visa_information",
            "summary": " Work visa overview. ",
            "structured_data": {"cost": "$300"}
        }));
        assert_eq!(extraction.content_type, "visa_information");
        assert_eq!(extraction.summary, "Work visa overview.");
        assert_eq!(extraction.fields.get("cost"), Some(&json!("$300")));
    }

    #[test]
    fn test_extraction_defaults() {
        assert_eq!(Extraction::from_value(json!([1, 2])), Extraction::unknown());

        let partial = Extraction::from_value(json!({"summary": 5, "structured_data": "x"}));
        assert_eq!(partial.content_type, UNKNOWN_CONTENT_TYPE);
        assert_eq!(partial.summary, "");
        assert!(partial.fields.is_empty());
    }
}
