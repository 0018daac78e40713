use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_MONTHLY_TOKEN_BUDGET: u64 = 1_000_000;

/// Token counters reported by the generative provider.
///
/// Counters only ever grow; `add` saturates instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64, total: u64) -> Self {
        Self {
            input,
            output,
            total,
        }
    }

    pub fn add(&mut self, delta: TokenUsage) {
        self.input = self.input.saturating_add(delta.input);
        self.output = self.output.saturating_add(delta.output);
        self.total = self.total.saturating_add(delta.total);
    }

    pub fn is_zero(&self) -> bool {
        *self == TokenUsage::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Enthusiastic,
    Concise,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Concise => "concise",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ResponseLength {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseLength::Short => "short",
            ResponseLength::Medium => "medium",
            ResponseLength::Long => "long",
        }
    }
}

/// Generative-fallback settings. Owned by the controlling context; the page
/// scanner never sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub api_key: String,
    pub personality: String,
    pub tone: Tone,
    pub response_length: ResponseLength,
    pub selected_model: String,
    pub token_usage: TokenUsage,
    pub monthly_token_budget: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            personality: "Professional, experienced, and solution-oriented.".to_string(),
            tone: Tone::default(),
            response_length: ResponseLength::default(),
            selected_model: DEFAULT_MODEL.to_string(),
            token_usage: TokenUsage::default(),
            monthly_token_budget: DEFAULT_MONTHLY_TOKEN_BUDGET,
        }
    }
}

impl AiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Model id to send to the provider, falling back to the default when unset.
    pub fn model(&self) -> &str {
        if self.selected_model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            &self.selected_model
        }
    }

    pub fn record_usage(&mut self, delta: TokenUsage) {
        self.token_usage.add(delta);
    }

    pub fn remaining_budget(&self) -> u64 {
        self.monthly_token_budget
            .saturating_sub(self.token_usage.total)
    }

    pub fn is_over_budget(&self) -> bool {
        self.token_usage.total > self.monthly_token_budget
    }
}

/// A selectable generative model and its list price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    pub id: &'static str,
    pub name: &'static str,
    pub cost_desc: &'static str,
    #[serde(rename = "inputCostPer1M")]
    pub input_cost_per_1m: f64,
    #[serde(rename = "outputCostPer1M")]
    pub output_cost_per_1m: f64,
}

pub const AI_MODELS: &[AiModel] = &[
    AiModel {
        id: "gemini-3-flash-preview",
        name: "Gemini 2.0 Flash",
        cost_desc: "Fast & Efficient. ~$0.10 / 1M tokens",
        input_cost_per_1m: 0.10,
        output_cost_per_1m: 0.40,
    },
    AiModel {
        id: "gemini-3-pro-preview",
        name: "Gemini 2.0 Pro",
        cost_desc: "High Reasoning. ~$3.50 / 1M tokens",
        input_cost_per_1m: 3.50,
        output_cost_per_1m: 10.50,
    },
    AiModel {
        id: "gemini-2.5-flash-latest",
        name: "Gemini 1.5 Flash",
        cost_desc: "Legacy Fast. ~$0.075 / 1M tokens",
        input_cost_per_1m: 0.075,
        output_cost_per_1m: 0.30,
    },
];

pub fn find_model(id: &str) -> Option<&'static AiModel> {
    AI_MODELS.iter().find(|m| m.id == id)
}

/// Estimated USD cost of `usage` on `model_id`. `None` for unknown models.
pub fn estimate_cost(model_id: &str, usage: &TokenUsage) -> Option<f64> {
    let model = find_model(model_id)?;
    Some(
        usage.input as f64 / 1_000_000.0 * model.input_cost_per_1m
            + usage.output as f64 / 1_000_000.0 * model.output_cost_per_1m,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_add_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage::new(10, 5, 15));
        usage.add(TokenUsage::new(1, 2, 3));
        assert_eq!(usage, TokenUsage::new(11, 7, 18));
    }

    #[test]
    fn test_token_usage_add_saturates() {
        let mut usage = TokenUsage::new(u64::MAX - 1, 0, u64::MAX);
        usage.add(TokenUsage::new(10, 1, 10));
        assert_eq!(usage.input, u64::MAX);
        assert_eq!(usage.total, u64::MAX);
    }

    #[test]
    fn test_default_config_matches_stored_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.selected_model, DEFAULT_MODEL);
        assert_eq!(config.monthly_token_budget, 1_000_000);
        assert_eq!(config.tone, Tone::Professional);
        assert_eq!(config.response_length, ResponseLength::Medium);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_budget_tracking() {
        let mut config = AiConfig {
            monthly_token_budget: 100,
            ..Default::default()
        };
        config.record_usage(TokenUsage::new(40, 30, 70));
        assert_eq!(config.remaining_budget(), 30);
        assert!(!config.is_over_budget());
        config.record_usage(TokenUsage::new(20, 20, 40));
        assert_eq!(config.remaining_budget(), 0);
        assert!(config.is_over_budget());
    }

    #[test]
    fn test_model_falls_back_when_unset() {
        let config = AiConfig {
            selected_model: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_estimate_cost() {
        let usage = TokenUsage::new(1_000_000, 1_000_000, 2_000_000);
        let cost = estimate_cost("gemini-3-flash-preview", &usage).unwrap();
        assert!((cost - 0.50).abs() < 1e-9);
        assert!(estimate_cost("unknown-model", &usage).is_none());
    }

    #[test]
    fn test_config_deserializes_camel_case() {
        let json = r#"{"apiKey": "k", "tone": "concise", "tokenUsage": {"input": 1, "output": 2, "total": 3}}"#;
        let config: AiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.tone, Tone::Concise);
        assert_eq!(config.token_usage.total, 3);
        assert_eq!(config.monthly_token_budget, 1_000_000);
    }
}
