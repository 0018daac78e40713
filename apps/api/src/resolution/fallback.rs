//! Generative fallback for fields the rule matcher left unresolved.

use std::time::Duration;

use tracing::{debug, warn};

use crate::llm_client::prompts::{HINT_ANSWER, HINT_EXTRACT};
use crate::llm_client::{GenerationRequest, GenerationResult, Generator, LlmError};
use crate::models::{AiConfig, DetectedField, FieldType, UserProfile};

/// Free-text areas are always eligible. Single-line text, url and tel fields
/// are eligible only when a usable active resume might carry the fact.
pub fn is_eligible(field: &DetectedField, has_usable_resume: bool) -> bool {
    if field.is_resolved() {
        return false;
    }
    field.field_type == FieldType::Textarea
        || (has_usable_resume && field.field_type.is_extractable())
}

pub fn hint_for(field_type: FieldType) -> &'static str {
    if field_type == FieldType::Textarea {
        HINT_ANSWER
    } else {
        HINT_EXTRACT
    }
}

pub fn build_request(
    field: &DetectedField,
    profile: &UserProfile,
    page_url: Option<&str>,
) -> GenerationRequest {
    GenerationRequest {
        question: format!("{} ({})", field.name, hint_for(field.field_type)),
        profile_summary: profile.summary_text(),
        resume_text: profile.active_resume().map(|r| r.content.clone()),
        page_context: page_url
            .filter(|u| !u.trim().is_empty())
            .map(|u| format!("URL: {u}")),
    }
}

/// Asks the generator for one field's value. Every failure mode (error,
/// timeout, sentinel reply) yields `None`; nothing propagates to the batch.
pub async fn generate_for_field(
    generator: &dyn Generator,
    request: &GenerationRequest,
    config: &AiConfig,
    timeout: Duration,
) -> Option<GenerationResult> {
    let outcome = tokio::time::timeout(timeout, generator.generate(request, config))
        .await
        .unwrap_or(Err(LlmError::Timeout(timeout)));

    match outcome {
        Ok(result) if result.is_usable() => Some(result),
        Ok(result) => {
            debug!(
                "Generator declined {:?}: {}",
                request.question, result.text
            );
            None
        }
        Err(e) => {
            warn!("Generation failed for {:?}: {e}", request.question);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn resume_profile() -> UserProfile {
        let mut profile = UserProfile::default();
        profile.add_resume("r1", "Main", "Jane Doe. +1 555 0100. github.com/jane");
        profile
    }

    fn empty(field_type: FieldType) -> DetectedField {
        DetectedField::new("autofill_0", "Question", field_type, "")
    }

    #[test]
    fn test_textarea_always_eligible_when_unresolved() {
        assert!(is_eligible(&empty(FieldType::Textarea), false));
        assert!(is_eligible(&empty(FieldType::Textarea), true));
    }

    #[test]
    fn test_tel_requires_active_resume() {
        let profile = resume_profile();
        assert!(profile.phone.is_empty());
        assert!(is_eligible(&empty(FieldType::Tel), profile.has_usable_resume()));
        assert!(!is_eligible(&empty(FieldType::Tel), UserProfile::default().has_usable_resume()));
    }

    #[test]
    fn test_other_types_never_eligible() {
        for t in [FieldType::Email, FieldType::Select, FieldType::Date] {
            assert!(!is_eligible(&empty(t), true), "{t:?}");
        }
    }

    #[test]
    fn test_resolved_fields_are_not_eligible() {
        let mut field = empty(FieldType::Textarea);
        field.predicted_value = Some("already".to_string());
        field.confidence = 1;
        assert!(!is_eligible(&field, true));
    }

    #[test]
    fn test_request_hints_and_context() {
        let profile = resume_profile();
        let mut field = empty(FieldType::Url);
        field.name = "GitHub".to_string();
        let request = build_request(&field, &profile, Some("https://jobs.example.com/1"));
        assert_eq!(request.question, "GitHub (Extract exact value)");
        assert_eq!(request.page_context.as_deref(), Some("URL: https://jobs.example.com/1"));
        assert!(request.resume_text.unwrap().contains("github.com/jane"));

        let mut essay = empty(FieldType::Textarea);
        essay.name = "Why us?".to_string();
        let request = build_request(&essay, &UserProfile::default(), None);
        assert_eq!(request.question, "Why us? (Answer based on profile)");
        assert_eq!(request.resume_text, None);
        assert_eq!(request.page_context, None);
    }

    struct Slow;

    #[async_trait]
    impl Generator for Slow {
        async fn generate(
            &self,
            _request: &GenerationRequest,
            _config: &AiConfig,
        ) -> Result<GenerationResult, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(GenerationResult {
                text: "too late".to_string(),
                usage: Default::default(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_generator_times_out() {
        let request = build_request(&empty(FieldType::Textarea), &UserProfile::default(), None);
        let result =
            generate_for_field(&Slow, &request, &AiConfig::default(), Duration::from_secs(5)).await;
        assert!(result.is_none());
    }
}
