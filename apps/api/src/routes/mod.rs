pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::llm_client::handlers as ai;
use crate::models::handlers as profile;
use crate::resolution::handlers as autofill;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Autofill API
        .route("/api/v1/autofill/scan", post(autofill::handle_scan))
        .route("/api/v1/autofill/match", post(autofill::handle_match))
        .route("/api/v1/autofill/resolve", post(autofill::handle_resolve))
        .route("/api/v1/autofill/run", post(autofill::handle_run))
        // AI settings API
        .route("/api/v1/ai/models", get(ai::handle_list_models))
        .route("/api/v1/ai/models/:id", get(ai::handle_get_model))
        .route("/api/v1/ai/validate-key", post(ai::handle_validate_key))
        // Profile API
        .route("/api/v1/profile/resumes", post(profile::handle_add_resume))
        .route(
            "/api/v1/profile/resumes/active",
            post(profile::handle_set_active_resume),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::{GenerationRequest, GenerationResult, Generator, LlmError};
    use crate::models::{AiConfig, TokenUsage};
    use crate::scanner::retry::RetryPolicy;

    /// Answers every question with the same text.
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
            _config: &AiConfig,
        ) -> Result<GenerationResult, LlmError> {
            Ok(GenerationResult {
                text: "I enjoy hard problems.".to_string(),
                usage: TokenUsage::new(100, 20, 120),
            })
        }
    }

    fn test_state() -> AppState {
        let config = Config {
            scan_retry: RetryPolicy {
                max_retries: 0,
                delay: Duration::ZERO,
            },
            fill_pacing: Duration::ZERO,
            gemini_api_base: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let mut state = AppState::new(config);
        state.generator = Arc::new(EchoGenerator);
        state
    }

    async fn send(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn application_document() -> Value {
        json!({
            "tag": "form",
            "children": [
                {"tag": "label", "attrs": {"for": "fn"}, "text": "First Name*"},
                {"tag": "input", "attrs": {"id": "fn", "type": "text"}},
                {"tag": "label", "attrs": {"for": "cover"}, "text": "Why do you want to work here?"},
                {"tag": "textarea", "attrs": {"id": "cover"}},
                {"tag": "input", "attrs": {"type": "hidden", "name": "csrf"}}
            ]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_scan_returns_labelled_fields() {
        let (status, body) = send(
            "POST",
            "/api/v1/autofill/scan",
            Some(json!({"document": application_document()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fields = body["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["name"], "First Name");
        assert_eq!(fields[1]["type"], "textarea");
        assert!(body["scannedAt"].is_string());
    }

    #[tokio::test]
    async fn test_scan_rejects_empty_document_tag() {
        let (status, body) = send(
            "POST",
            "/api/v1/autofill/scan",
            Some(json!({"document": {"tag": ""}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_skips_malformed_records() {
        let (status, body) = send(
            "POST",
            "/api/v1/autofill/match",
            Some(json!({
                "fields": [
                    {"id": "autofill_0", "name": "E-Mail Address*", "type": "email"},
                    {"name": "no id"},
                    42
                ],
                "profile": {"email": "jane@example.com"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let fields = body["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["predictedValue"], "jane@example.com");
        assert_eq!(fields[0]["confidence"], 1);
    }

    #[tokio::test]
    async fn test_resolve_records_usage_in_config() {
        let (status, body) = send(
            "POST",
            "/api/v1/autofill/resolve",
            Some(json!({
                "fields": [
                    {"id": "autofill_1", "name": "Why do you want to work here?", "type": "textarea"}
                ],
                "profile": {"firstName": "Jane"},
                "aiConfig": {"apiKey": "k", "tokenUsage": {"input": 1, "output": 1, "total": 2}},
                "pageUrl": "https://jobs.example.com/42"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fields"][0]["predictedValue"], "I enjoy hard problems.");
        assert_eq!(body["fields"][0]["isAiGenerated"], true);
        assert_eq!(body["usage"]["total"], 120);
        assert_eq!(body["aiConfig"]["tokenUsage"]["total"], 122);
        assert!(body["estimatedCostUsd"].is_f64());
    }

    #[tokio::test]
    async fn test_run_fills_document() {
        let (status, body) = send(
            "POST",
            "/api/v1/autofill/run",
            Some(json!({
                "document": application_document(),
                "profile": {"firstName": "Jane"},
                "aiConfig": {"apiKey": "k"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filled"], json!(["autofill_0", "autofill_1"]));
        assert_eq!(body["controlValues"]["autofill_0"], "Jane");
        assert_eq!(body["controlValues"]["autofill_1"], "I enjoy hard problems.");
        assert_eq!(body["progress"].as_array().unwrap().len(), 2);
        assert!(body["sessionId"].is_string());
    }

    #[tokio::test]
    async fn test_models_catalog() {
        let (status, body) = send("GET", "/api/v1/ai/models", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"].as_array().unwrap().len(), 3);
        assert_eq!(body["defaultModel"], "gemini-3-flash-preview");

        let (status, body) = send("GET", "/api/v1/ai/models/gemini-3-pro-preview", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inputCostPer1M"], 3.5);

        let (status, body) = send("GET", "/api/v1/ai/models/gpt-unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_validate_empty_key_is_invalid() {
        let (status, body) = send(
            "POST",
            "/api/v1/ai/validate-key",
            Some(json!({"apiKey": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn test_resume_management() {
        let (status, body) = send(
            "POST",
            "/api/v1/profile/resumes",
            Some(json!({"name": "Main CV", "content": "Ten years of backend work."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hasUsableResume"], true);
        assert_eq!(body["profile"]["resumes"][0]["isActive"], true);

        let (status, body) = send(
            "POST",
            "/api/v1/profile/resumes/active",
            Some(json!({"profile": body["profile"].clone(), "resumeId": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
