//! Source adapters: thin clients that fetch raw records for a query.
//!
//! Adapters never shape records into [`crate::ContentItem`]s themselves; they
//! hand back the upstream JSON objects and the normalizer does the rest.

mod google_news;
mod newsapi;
mod reddit;
mod rss_helpers;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::SentimentError;
use crate::types::Source;

pub use google_news::GoogleNewsRssClient;
pub use newsapi::{DateWindow, NewsApiClient};
pub use reddit::RedditClient;

/// A dynamically-shaped record as returned by an upstream API.
pub type RawItem = serde_json::Value;

const USER_AGENT: &str = "brandpulse/0.1 (brand-sentiment)";

/// Fetches raw records from one external content source.
pub trait SourceAdapter: Send + Sync {
    /// Stable name used in logs and diagnostics (e.g. `newsapi`).
    fn name(&self) -> &str;

    /// Kind of content this adapter returns.
    fn source(&self) -> Source;

    /// Fetch up to `limit` raw records matching `query`.
    ///
    /// Any failure is reported as [`SentimentError::SourceUnavailable`].
    fn fetch<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<RawItem>, SentimentError>>;
}

/// Build the shared `reqwest` client configuration used by every adapter.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, SentimentError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent.unwrap_or(USER_AGENT))
        .build()?;
    Ok(client)
}

/// Parse a base URL, normalising it to end with exactly one slash so that
/// relative joins append rather than replace the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<reqwest::Url, SentimentError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    reqwest::Url::parse(&normalised).map_err(|e| SentimentError::SourceUnavailable {
        source_name: "config".to_string(),
        reason: format!("invalid base URL '{base_url}': {e}"),
    })
}

pub(crate) fn join_url(base: &reqwest::Url, path: &str) -> Result<reqwest::Url, SentimentError> {
    base.join(path).map_err(|e| SentimentError::SourceUnavailable {
        source_name: "config".to_string(),
        reason: format!("invalid path '{path}': {e}"),
    })
}
