use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_BASE;
use crate::resolution::ResolveOptions;
use crate::scanner::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_base: String,
    /// Upper bound on one generative call.
    pub llm_timeout: Duration,
    pub scan_retry: RetryPolicy,
    pub fill_pacing: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let resolve = ResolveOptions::default();
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            llm_timeout: resolve.llm_timeout,
            scan_retry: RetryPolicy::default(),
            fill_pacing: resolve.fill_pacing,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            gemini_api_base: std::env::var("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 30)?),
            scan_retry: RetryPolicy {
                max_retries: env_or("SCAN_RETRIES", defaults.scan_retry.max_retries)?,
                delay: Duration::from_millis(env_or("SCAN_RETRY_DELAY_MS", 500)?),
            },
            fill_pacing: Duration::from_millis(env_or("FILL_PACING_MS", 50)?),
        })
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            llm_timeout: self.llm_timeout,
            fill_pacing: self.fill_pacing,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'"))
}
