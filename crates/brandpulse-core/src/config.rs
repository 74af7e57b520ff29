use std::str::FromStr;

use crate::app_config::{AppConfig, RedditCredentials};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every credential is optional: a missing key disables the collaborator that
/// needs it. Blank values are treated the same as unset ones.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let news_api_key = optional("NEWS_API_KEY");
    let groq_api_key = optional("GROQ_API_KEY");
    let reddit = match (optional("REDDIT_CLIENT_ID"), optional("REDDIT_CLIENT_SECRET")) {
        (Some(client_id), Some(client_secret)) => Some(RedditCredentials {
            client_id,
            client_secret,
        }),
        _ => None,
    };

    let log_level = or_default("BRANDPULSE_LOG_LEVEL", "info");
    let reddit_user_agent = or_default("REDDIT_USER_AGENT", "BrandReputationDashboard");
    let groq_model = or_default("BRANDPULSE_GROQ_MODEL", "llama3-8b-8192");

    let google_news_enabled = parse_bool(&or_default("BRANDPULSE_GOOGLE_NEWS_ENABLED", "true"))
        .ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "BRANDPULSE_GOOGLE_NEWS_ENABLED".to_string(),
            reason: "expected true/false".to_string(),
        })?;

    let request_timeout_secs: u64 =
        parse_number(&or_default, "BRANDPULSE_REQUEST_TIMEOUT_SECS", "30")?;
    let pipeline_timeout_secs: u64 =
        parse_number(&or_default, "BRANDPULSE_PIPELINE_TIMEOUT_SECS", "60")?;
    let max_news: usize = parse_number(&or_default, "BRANDPULSE_MAX_NEWS", "50")?;
    let max_reddit: usize = parse_number(&or_default, "BRANDPULSE_MAX_REDDIT", "20")?;
    let classifier_timeout_ms: u64 =
        parse_number(&or_default, "BRANDPULSE_CLASSIFIER_TIMEOUT_MS", "2000")?;
    let max_retries: u32 = parse_number(&or_default, "BRANDPULSE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms: u64 =
        parse_number(&or_default, "BRANDPULSE_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        log_level,
        news_api_key,
        groq_api_key,
        reddit,
        reddit_user_agent,
        google_news_enabled,
        groq_model,
        request_timeout_secs,
        pipeline_timeout_secs,
        max_news,
        max_reddit,
        classifier_timeout_ms,
        max_retries,
        retry_backoff_base_ms,
    })
}

fn parse_number<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse common boolean spellings. Returns `None` for anything else.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
