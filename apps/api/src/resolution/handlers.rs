//! Axum route handlers for the Autofill API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ai_config::estimate_cost;
use crate::models::field::parse_field_records;
use crate::models::{AiConfig, DetectedField, TokenUsage, UserProfile};
use crate::resolution::matcher::match_fields;
use crate::resolution::{resolve, run_autofill, FillProgress};
use crate::scanner::document::{Document, ElementSnapshot};
use crate::scanner::Scanner;
use crate::state::AppState;
use crate::transport::{LocalChannel, PageState};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub document: ElementSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub fields: Vec<DetectedField>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub fields: Vec<DetectedField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub ai_config: AiConfig,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub fields: Vec<DetectedField>,
    pub usage: TokenUsage,
    /// Caller's config with this request's usage recorded.
    pub ai_config: AiConfig,
    pub estimated_cost_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub document: ElementSnapshot,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub ai_config: AiConfig,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub session_id: Uuid,
    pub fields: Vec<DetectedField>,
    pub filled: Vec<String>,
    pub fill_failures: Vec<String>,
    pub usage: TokenUsage,
    pub ai_config: AiConfig,
    pub progress: Vec<FillProgress>,
    /// Page after the last fill.
    #[serde(flatten)]
    pub page: PageState,
}

fn validate_document(document: &ElementSnapshot) -> Result<(), AppError> {
    if document.tag.trim().is_empty() {
        return Err(AppError::Validation(
            "document.tag cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn with_recorded_usage(mut config: AiConfig, usage: TokenUsage) -> AiConfig {
    config.record_usage(usage);
    if config.is_over_budget() {
        warn!(
            "Monthly token budget exceeded: {} used of {}",
            config.token_usage.total, config.monthly_token_budget
        );
    } else {
        debug!("{} tokens left in monthly budget", config.remaining_budget());
    }
    config
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/autofill/scan
///
/// Runs the page scanner once over a document snapshot.
pub async fn handle_scan(Json(request): Json<ScanRequest>) -> Result<Json<ScanResponse>, AppError> {
    validate_document(&request.document)?;

    let mut document = Document::from_snapshot(&request.document);
    let fields = Scanner::new().scan(&mut document);

    Ok(Json(ScanResponse {
        fields,
        scanned_at: Utc::now(),
    }))
}

/// POST /api/v1/autofill/match
///
/// Stage 1 only: deterministic profile matching, no generative calls.
pub async fn handle_match(Json(request): Json<MatchRequest>) -> Json<MatchResponse> {
    let fields = parse_field_records(request.fields);
    Json(MatchResponse {
        fields: match_fields(fields, &request.profile),
    })
}

/// POST /api/v1/autofill/resolve
///
/// Stage 1 then Stage 2 over already-scanned fields. Returns the caller's
/// config with usage recorded; persisting it is up to the caller.
pub async fn handle_resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let fields = parse_field_records(request.fields);
    let resolution = resolve(
        fields,
        &request.profile,
        &request.ai_config,
        request.page_url.as_deref(),
        state.generator.as_ref(),
        state.config.resolve_options(),
    )
    .await;

    let ai_config = with_recorded_usage(request.ai_config, resolution.usage);
    let estimated_cost_usd = estimate_cost(ai_config.model(), &resolution.usage);

    Json(ResolveResponse {
        fields: resolution.fields,
        usage: resolution.usage,
        ai_config,
        estimated_cost_usd,
    })
}

/// POST /api/v1/autofill/run
///
/// Full cycle over a document snapshot: scan → match → resolve → fill.
/// Returns the resolved fields and the document's control values afterwards.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    validate_document(&request.document)?;

    let session_id = Uuid::new_v4();
    info!("Autofill session {session_id} started");

    let channel = LocalChannel::new(
        Document::from_snapshot(&request.document),
        state.config.scan_retry,
    );
    let mut progress = Vec::new();
    let report = run_autofill(
        &channel,
        state.generator.as_ref(),
        &request.profile,
        &request.ai_config,
        request.page_url.as_deref(),
        state.config.resolve_options(),
        |p| progress.push(p),
    )
    .await?;

    let ai_config = with_recorded_usage(request.ai_config, report.usage);
    info!(
        "Autofill session {session_id} finished: {} filled, {} failed",
        report.filled.len(),
        report.fill_failures.len()
    );

    Ok(Json(RunResponse {
        session_id,
        fields: report.fields,
        filled: report.filled,
        fill_failures: report.fill_failures,
        usage: report.usage,
        ai_config,
        progress,
        page: channel.page_state().await,
    }))
}
