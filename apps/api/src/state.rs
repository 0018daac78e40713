use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::{GeminiClient, Generator};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generative fallback used by the resolution pipeline. Default: `GeminiClient`.
    pub generator: Arc<dyn Generator>,
    /// Concrete client, kept for key validation.
    pub llm: GeminiClient,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let llm = GeminiClient::new(config.gemini_api_base.clone(), config.llm_timeout);
        Self {
            generator: Arc::new(llm.clone()),
            llm,
            config,
        }
    }
}
