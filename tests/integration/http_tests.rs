//! HTTP renderer and LLM classifier tests against wiremock servers

use crate::common::{job_config, page};
use serde_json::json;
use site_harvest::config::{ClassifierConfig, CrawlerConfig, Provider};
use site_harvest::crawler::{retry_when, run_job, HttpRenderer, RenderError, Renderer, RunOptions};
use site_harvest::enrich::{Classifier, ClassifyError, LlmClassifier};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn renderer() -> HttpRenderer {
    HttpRenderer::new(&CrawlerConfig::default()).expect("client builds")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn anthropic_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    }))
}

fn chat_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    }))
}

fn classifier_config(server: &MockServer, provider: Provider) -> ClassifierConfig {
    ClassifierConfig {
        provider,
        endpoint: Some(server.uri()),
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..ClassifierConfig::default()
    }
}

#[tokio::test]
async fn test_renderer_returns_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html(page("Guide", &[])))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/guide", server.uri())).unwrap();
    let body = renderer().render(&url).await.unwrap();
    assert!(body.contains("<h1>Guide</h1>"));
}

#[tokio::test]
async fn test_renderer_rejects_missing_and_non_html_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/form.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let missing = Url::parse(&format!("{}/missing", server.uri())).unwrap();
    let err = renderer().render(&missing).await.unwrap_err();
    assert!(matches!(err, RenderError::Http { status: 404, .. }));
    assert!(!err.is_retryable());

    let pdf = Url::parse(&format!("{}/form.pdf", server.uri())).unwrap();
    let err = renderer().render(&pdf).await.unwrap_err();
    assert!(matches!(err, RenderError::NotHtml { .. }));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html(page("Flaky", &[])))
        .mount(&server)
        .await;

    let renderer = renderer();
    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
    let body = retry_when(
        |_| renderer.render(&url),
        2,
        Duration::ZERO,
        RenderError::is_retryable,
    )
    .await
    .unwrap();

    assert!(body.contains("Flaky"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_anthropic_extraction_from_fenced_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "secret"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(anthropic_reply(
            "Here you go:\n```json\n{\"content_type\": \"visa_information\", \
             \"summary\": \"Work visa\", \"structured_data\": {\"fee\": \"$120\"}}\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::new(&classifier_config(&server, Provider::Anthropic), "secret").unwrap();
    let extraction = classifier.extract("Work visa", "Fees: $120").await.unwrap();

    assert_eq!(extraction.content_type, "visa_information");
    assert_eq!(extraction.summary, "Work visa");
    assert_eq!(extraction.fields.get("fee"), Some(&json!("$120")));
}

#[tokio::test]
async fn test_unreadable_extraction_falls_back_to_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_reply("I could not find anything structured here."))
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::new(&classifier_config(&server, Provider::Anthropic), "secret").unwrap();
    let extraction = classifier.extract("Page", "text").await.unwrap();

    assert_eq!(extraction.content_type, "unknown");
    assert!(extraction.fields.is_empty());
}

#[tokio::test]
async fn test_openai_label_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(chat_reply("How to apply."))
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::new(&classifier_config(&server, Provider::OpenAi), "secret").unwrap();

    let label = classifier.classify("Apply online", "Submit the form").await.unwrap();
    assert_eq!(label, "how_to_apply");
}

#[tokio::test]
async fn test_azure_deployment_url_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/harvest/chat/completions"))
        .and(query_param("api-version", "2024-02-01"))
        .and(header("api-key", "secret"))
        .respond_with(chat_reply("pricing"))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClassifierConfig {
        azure_deployment: Some("harvest".to_string()),
        ..classifier_config(&server, Provider::Azure)
    };
    let classifier = LlmClassifier::new(&config, "secret").unwrap();

    // Outside the canonical set
    assert_eq!(classifier.classify("Fees", "It costs money").await.unwrap(), "other");
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let classifier =
        LlmClassifier::new(&classifier_config(&server, Provider::Anthropic), "secret").unwrap();
    let err = classifier.extract("Page", "text").await.unwrap_err();

    match err {
        ClassifyError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_job_over_http() {
    let site = MockServer::start().await;
    let base = site.uri();
    Mock::given(method("GET"))
        .and(path("/guide/"))
        .respond_with(html(page("Guide", &["/guide/apply", "/guide/fees"])))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/guide/apply"))
        .respond_with(html(page("Apply", &[])))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/guide/fees"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_reply(
            r#"{"content_type": "guide", "summary": "A guide", "structured_data": {"steps": 3}}"#,
        ))
        .mount(&llm)
        .await;

    let dir = TempDir::new().unwrap();
    let config = job_config(dir.path(), &format!("{}/guide/", base), "max-depth = 1");
    let classifier = LlmClassifier::new(&classifier_config(&llm, Provider::Anthropic), "k").unwrap();

    let result = run_job(
        &config,
        None,
        renderer(),
        Some(classifier),
        RunOptions::default(),
    )
    .await
    .unwrap()
    .expect("enrichment ran");

    assert_eq!(result.metadata.total_pages, 2);
    assert_eq!(result.metadata.failed, 1);
    assert_eq!(result.metadata.failed_urls, vec![format!("{}/guide/fees", base)]);
    assert_eq!(result.main_page.as_ref().map(|p| p.content_type.as_str()), Some("guide"));
    assert_eq!(result.child_pages.len(), 1);
    // The mock answers synthesis with the same object
    assert_eq!(result.synthesized_fields.get("content_type"), Some(&json!("guide")));

    // 500 is retried once before the page is given up on
    let fee_requests = site
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/guide/fees")
        .count();
    assert_eq!(fee_requests, 2);
}
