//! Resolution Pipeline — turns scanned fields plus a profile into fill values.
//!
//! Flow: scan (over the page channel) → Stage 1 deterministic match for every
//! field → Stage 2 generative fallback, one field at a time in scan order →
//! Stage 3 fill command per resolved field, with progress after each field.
//!
//! Token usage is an explicit accumulator returned to the caller, who owns
//! persisting it into `AiConfig`.

pub mod fallback;
pub mod handlers;
pub mod matcher;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::llm_client::Generator;
use crate::models::{AiConfig, DetectedField, TokenUsage, UserProfile};
use crate::resolution::fallback::{build_request, generate_for_field, is_eligible};
use crate::resolution::matcher::match_fields;
use crate::transport::{request_fill, request_scan, PageChannel, TransportError};

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Upper bound on a single generative call.
    pub llm_timeout: Duration,
    /// Pause between fields while filling the page.
    pub fill_pacing: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(30),
            fill_pacing: Duration::from_millis(50),
        }
    }
}

/// Resolved fields plus the usage consumed producing them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub fields: Vec<DetectedField>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillProgress {
    pub completed: usize,
    pub total: usize,
}

impl FillProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100 + self.total / 2) / self.total) as u8
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillReport {
    pub fields: Vec<DetectedField>,
    /// Ids the page acknowledged filling, in order.
    pub filled: Vec<String>,
    /// Ids whose fill command the page rejected or never received.
    pub fill_failures: Vec<String>,
    pub usage: TokenUsage,
}

/// Resolves one field through Stage 2, returning the updated field and the
/// usage delta it cost. Ineligible or failed fields come back untouched.
async fn resolve_field(
    mut field: DetectedField,
    ctx: &FallbackContext<'_>,
) -> (DetectedField, TokenUsage) {
    if !ctx.enabled || !is_eligible(&field, ctx.has_usable_resume) {
        return (field, TokenUsage::default());
    }

    let request = build_request(&field, ctx.profile, ctx.page_url);
    match generate_for_field(ctx.generator, &request, ctx.config, ctx.timeout).await {
        Some(result) => {
            debug!("Field {} resolved by generator", field.id);
            field.predicted_value = Some(result.text);
            field.is_ai_generated = Some(true);
            (field, result.usage)
        }
        None => (field, TokenUsage::default()),
    }
}

struct FallbackContext<'a> {
    generator: &'a dyn Generator,
    profile: &'a UserProfile,
    config: &'a AiConfig,
    page_url: Option<&'a str>,
    timeout: Duration,
    has_usable_resume: bool,
    enabled: bool,
}

impl<'a> FallbackContext<'a> {
    fn new(
        generator: &'a dyn Generator,
        profile: &'a UserProfile,
        config: &'a AiConfig,
        page_url: Option<&'a str>,
        timeout: Duration,
    ) -> Self {
        let enabled = config.has_api_key();
        if !enabled {
            info!("No API key configured; skipping generative fallback");
        }
        Self {
            generator,
            profile,
            config,
            page_url,
            timeout,
            has_usable_resume: profile.has_usable_resume(),
            enabled,
        }
    }
}

/// Runs Stage 1 over every field, then Stage 2 sequentially over the rest.
/// Never fails: a field whose generative call fails simply stays unresolved.
pub async fn resolve(
    fields: Vec<DetectedField>,
    profile: &UserProfile,
    config: &AiConfig,
    page_url: Option<&str>,
    generator: &dyn Generator,
    options: ResolveOptions,
) -> Resolution {
    let matched = match_fields(fields, profile);
    let ctx = FallbackContext::new(generator, profile, config, page_url, options.llm_timeout);

    let mut usage = TokenUsage::default();
    let mut resolved = Vec::with_capacity(matched.len());
    for field in matched {
        let (field, delta) = resolve_field(field, &ctx).await;
        usage.add(delta);
        resolved.push(field);
    }

    Resolution {
        fields: resolved,
        usage,
    }
}

/// Full autofill cycle against a page: scan, match, resolve and fill.
///
/// `on_progress` is called after every field with `(completed, total)`. Fills
/// are best-effort and not retried: a fill the page rejects or never receives
/// is listed in `fill_failures` and the batch continues. Only the scan can
/// fail the run. Dropping the returned future cancels the
/// batch; fields already filled stay filled.
pub async fn run_autofill(
    channel: &dyn PageChannel,
    generator: &dyn Generator,
    profile: &UserProfile,
    config: &AiConfig,
    page_url: Option<&str>,
    options: ResolveOptions,
    mut on_progress: impl FnMut(FillProgress) + Send,
) -> Result<AutofillReport, TransportError> {
    let scanned = request_scan(channel).await?;
    if scanned.is_empty() {
        info!("No recognizable fields on page");
    }

    let matched = match_fields(scanned, profile);
    info!(
        "Deterministic match resolved {}/{} fields",
        matched.iter().filter(|f| f.is_resolved()).count(),
        matched.len()
    );

    let ctx = FallbackContext::new(generator, profile, config, page_url, options.llm_timeout);
    let total = matched.len();
    let mut report = AutofillReport {
        fields: Vec::with_capacity(total),
        filled: Vec::new(),
        fill_failures: Vec::new(),
        usage: TokenUsage::default(),
    };

    for (index, field) in matched.into_iter().enumerate() {
        let (field, delta) = resolve_field(field, &ctx).await;
        report.usage.add(delta);

        if let Some(value) = field.resolved_value() {
            match request_fill(channel, &field.id, value).await {
                Ok(true) => report.filled.push(field.id.clone()),
                Ok(false) => {
                    warn!("Page could not fill {}", field.id);
                    report.fill_failures.push(field.id.clone());
                }
                Err(e) => {
                    warn!("Fill command for {} was not delivered: {e}", field.id);
                    report.fill_failures.push(field.id.clone());
                }
            }
        }
        report.fields.push(field);

        let progress = FillProgress {
            completed: index + 1,
            total,
        };
        debug!("Autofill progress {}%", progress.percent());
        on_progress(progress);
        if !options.fill_pacing.is_zero() && index + 1 < total {
            tokio::time::sleep(options.fill_pacing).await;
        }
    }

    info!(
        "Autofill filled {}/{} fields using {} tokens",
        report.filled.len(),
        total,
        report.usage.total
    );
    Ok(report)
}
