//! Axum route handlers for model selection and API key checks.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ai_config::{find_model, AiModel, AI_MODELS, DEFAULT_MODEL};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: &'static [AiModel],
    pub default_model: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeyRequest {
    pub api_key: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
}

/// GET /api/v1/ai/models
pub async fn handle_list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: AI_MODELS,
        default_model: DEFAULT_MODEL,
    })
}

/// GET /api/v1/ai/models/:id
pub async fn handle_get_model(Path(id): Path<String>) -> Result<Json<&'static AiModel>, AppError> {
    find_model(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Model {id} not found")))
}

/// POST /api/v1/ai/validate-key
///
/// Makes one minimal generation call with the key. An empty key is invalid
/// without touching the network.
pub async fn handle_validate_key(
    State(state): State<AppState>,
    Json(request): Json<ValidateKeyRequest>,
) -> Json<ValidateKeyResponse> {
    let model = request
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_MODEL);
    let valid = state.llm.validate_api_key(&request.api_key, model).await;
    Json(ValidateKeyResponse { valid })
}
