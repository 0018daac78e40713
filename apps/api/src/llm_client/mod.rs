/// LLM Client — the generative fallback behind the resolution pipeline.
///
/// The pipeline only sees the `Generator` trait: a prompt and grounding context
/// go in, text and token counts come out. `GeminiClient` is the production
/// backend (Gemini `generateContent`).
///
/// Reserved replies `ERROR` and `[MISSING]` are control signals, never fill content.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AiConfig, TokenUsage};

pub mod handlers;
pub mod prompts;

use prompts::{
    ANSWER_PROMPT_TEMPLATE, NO_RESUME_TEXT, SENTINEL_ERROR, SENTINEL_MISSING,
    SYSTEM_INSTRUCTION_TEMPLATE,
};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Low temperature keeps literal extraction deterministic.
const TEMPERATURE: f32 = 0.4;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// Everything the provider needs to answer one field.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Field label followed by the hint, e.g. `Phone (Extract exact value)`.
    pub question: String,
    pub profile_summary: String,
    /// Active resume text, if any.
    pub resume_text: Option<String>,
    /// Auxiliary page context, e.g. `URL: https://...`.
    pub page_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub usage: TokenUsage,
}

impl GenerationResult {
    pub fn error() -> Self {
        Self {
            text: SENTINEL_ERROR.to_string(),
            usage: TokenUsage::default(),
        }
    }

    /// False for empty text and for either sentinel.
    pub fn is_usable(&self) -> bool {
        let text = self.text.trim();
        !text.is_empty() && text != SENTINEL_ERROR && text != SENTINEL_MISSING
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &AiConfig,
    ) -> Result<GenerationResult, LlmError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UsageMetadata {
    prompt_token_count: u64,
    candidates_token_count: u64,
    total_token_count: u64,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        Some(text)
    }

    /// Missing usage metadata counts as zero.
    fn usage(&self) -> TokenUsage {
        self.usage_metadata
            .as_ref()
            .map(|m| {
                TokenUsage::new(
                    m.prompt_token_count,
                    m.candidates_token_count,
                    m.total_token_count,
                )
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

/// Gemini `generateContent` client. The API key travels with each call's
/// `AiConfig`, so one client serves every user.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_base: api_base.into(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }

    /// Single non-streaming call. No retries: a failed field stays unresolved.
    async fn call(
        &self,
        api_key: &str,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<GenerateContentResponse, LlmError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": TEMPERATURE },
        });

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {status}: {message}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(parsed)
    }

    /// True iff a minimal generation call with `api_key` succeeds.
    pub async fn validate_api_key(&self, api_key: &str, model: &str) -> bool {
        if api_key.trim().is_empty() {
            return false;
        }
        match self.call(api_key, model, "Reply briefly.", "Hello").await {
            Ok(_) => true,
            Err(e) => {
                warn!("API key validation failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &AiConfig,
    ) -> Result<GenerationResult, LlmError> {
        if !config.has_api_key() {
            return Ok(GenerationResult::error());
        }

        let system = build_system_instruction(config);
        let prompt = build_answer_prompt(request);
        let response = self
            .call(&config.api_key, config.model(), &system, &prompt)
            .await?;

        let usage = response.usage();
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let text = clean_answer(&text);

        debug!(
            "Generation succeeded: input_tokens={}, output_tokens={}",
            usage.input, usage.output
        );
        Ok(GenerationResult { text, usage })
    }
}

pub fn build_system_instruction(config: &AiConfig) -> String {
    SYSTEM_INSTRUCTION_TEMPLATE
        .replace("{personality}", &config.personality)
        .replace("{tone}", config.tone.as_str())
        .replace("{length}", config.response_length.as_str())
}

pub fn build_answer_prompt(request: &GenerationRequest) -> String {
    let resume_text = request
        .resume_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(NO_RESUME_TEXT);
    let page_context = request
        .page_context
        .as_deref()
        .map(|c| format!("Job Page Context: {c}"))
        .unwrap_or_default();

    ANSWER_PROMPT_TEMPLATE
        .replace("{profile_summary}", &request.profile_summary)
        .replace("{resume_text}", resume_text)
        .replace("{page_context}", &page_context)
        .replace("{question}", &request.question)
}

/// Trims the reply, drops one pair of wrapping quotes, and collapses any reply
/// mentioning `[MISSING]` to exactly that sentinel.
pub fn clean_answer(raw: &str) -> String {
    let text = raw.trim();
    if text.contains(SENTINEL_MISSING) {
        return SENTINEL_MISSING.to_string();
    }
    let text = strip_wrapping(text, '"');
    let text = strip_wrapping(text, '\'');
    text.trim().to_string()
}

fn strip_wrapping(text: &str, quote: char) -> &str {
    let text = text.strip_prefix(quote).unwrap_or(text);
    text.strip_suffix(quote).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ai_config::{ResponseLength, Tone};

    #[test]
    fn test_clean_answer_strips_quotes() {
        assert_eq!(
            clean_answer("  \"https://linkedin.com/in/jane\" "),
            "https://linkedin.com/in/jane"
        );
        assert_eq!(clean_answer("'Berlin'"), "Berlin");
        assert_eq!(clean_answer("It's fine"), "It's fine");
    }

    #[test]
    fn test_clean_answer_collapses_missing() {
        assert_eq!(clean_answer("Sorry, [MISSING] - not in resume"), SENTINEL_MISSING);
    }

    #[test]
    fn test_sentinels_are_not_usable() {
        let mut result = GenerationResult::error();
        assert!(!result.is_usable());
        result.text = SENTINEL_MISSING.to_string();
        assert!(!result.is_usable());
        result.text = "   ".to_string();
        assert!(!result.is_usable());
        result.text = "+1 555 0100".to_string();
        assert!(result.is_usable());
    }

    #[test]
    fn test_system_instruction_carries_style() {
        let config = AiConfig {
            personality: "Curious builder".to_string(),
            tone: Tone::Enthusiastic,
            response_length: ResponseLength::Short,
            ..Default::default()
        };
        let system = build_system_instruction(&config);
        assert!(system.contains("Personality: Curious builder"));
        assert!(system.contains("Tone: enthusiastic"));
        assert!(system.contains("Target Length: short"));
        assert!(system.contains("[MISSING]"));
    }

    #[test]
    fn test_answer_prompt_defaults_resume_and_context() {
        let request = GenerationRequest {
            question: "Phone (Extract exact value)".to_string(),
            profile_summary: "Name: Jane Doe".to_string(),
            resume_text: None,
            page_context: None,
        };
        let prompt = build_answer_prompt(&request);
        assert!(prompt.contains(NO_RESUME_TEXT));
        assert!(!prompt.contains("Job Page Context"));
        assert!(prompt.contains("Question/Label to fill: \"Phone (Extract exact value)\""));
    }

    #[test]
    fn test_answer_prompt_includes_page_context() {
        let request = GenerationRequest {
            question: "Why us? (Answer based on profile)".to_string(),
            profile_summary: String::new(),
            resume_text: Some("Built payment rails.".to_string()),
            page_context: Some("URL: https://jobs.example.com/42".to_string()),
        };
        let prompt = build_answer_prompt(&request);
        assert!(prompt.contains("Built payment rails."));
        assert!(prompt.contains("Job Page Context: URL: https://jobs.example.com/42"));
    }

    #[test]
    fn test_response_parsing_reads_text_and_usage() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "Jane"}, {"text": " Doe"}]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 3, "totalTokenCount": 123}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.usage(), TokenUsage::new(120, 3, 123));
    }

    #[test]
    fn test_response_without_usage_counts_zero() {
        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(parsed.text().is_none());
        assert!(parsed.usage().is_zero());
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let client = GeminiClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        let request = GenerationRequest {
            question: "Email (Extract exact value)".to_string(),
            profile_summary: String::new(),
            resume_text: None,
            page_context: None,
        };
        let result = client.generate(&request, &AiConfig::default()).await.unwrap();
        assert_eq!(result, GenerationResult::error());
        assert!(!client.validate_api_key("", "gemini-3-flash-preview").await);
    }

    #[test]
    fn test_endpoint_shape() {
        let client = GeminiClient::new("https://example.test/v1beta/", Duration::from_secs(1));
        assert_eq!(
            client.endpoint("gemini-3-flash-preview"),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }
}
