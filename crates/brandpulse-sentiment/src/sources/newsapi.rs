//! `NewsAPI` `/v2/everything` adapter.

use chrono::{Duration as ChronoDuration, NaiveDate};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{build_http_client, join_url, parse_base_url, RawItem, SourceAdapter};
use crate::error::SentimentError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::Source;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/";
const NAME: &str = "newsapi";

/// Largest `pageSize` `NewsAPI` accepts.
const MAX_PAGE_SIZE: usize = 100;

/// Inclusive publication date range for news searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Window from `days` days before `today` through `today`, both ends
    /// inclusive, so it spans `days + 1` calendar dates.
    #[must_use]
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        Self {
            from: today - ChronoDuration::days(i64::from(days)),
            to: today,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    articles: Vec<RawItem>,
    code: Option<String>,
    message: Option<String>,
}

/// Client for the `NewsAPI` article search.
pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
    window: Option<DateWindow>,
    retry: RetryPolicy,
}

impl NewsApiClient {
    /// Creates a client pointed at the production `NewsAPI`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SentimentError::SourceUnavailable`] for an invalid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout_secs, None)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            window: None,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Search articles matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// - [`SentimentError::NewsApi`] if the API answers with an error envelope.
    /// - [`SentimentError::Http`] on network failure or a 5xx/429 status.
    /// - [`SentimentError::Deserialize`] if a 2xx body is not the expected shape.
    pub async fn search_everything(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, SentimentError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = join_url(&self.base_url, "v2/everything")?;
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", limit.min(MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(window) = self.window {
            params.push(("from", window.from.format("%Y-%m-%d").to_string()));
            params.push(("to", window.to.format("%Y-%m-%d").to_string()));
        }

        let mut articles =
            retry_with_backoff(self.retry, NAME, || self.request(&url, &params)).await?;
        articles.truncate(limit);

        tracing::debug!(query, count = articles.len(), "fetched NewsAPI articles");
        Ok(articles)
    }

    async fn request(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<Vec<RawItem>, SentimentError> {
        let response = self
            .client
            .get(url.clone())
            .header("X-Api-Key", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            response.error_for_status_ref()?;
        }

        let body = response.text().await?;
        let envelope: EverythingResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SentimentError::NewsApi(format!("HTTP {status}")));
            }
            Err(e) => {
                return Err(SentimentError::Deserialize {
                    context: "newsapi everything".to_string(),
                    source: e,
                })
            }
        };

        if envelope.status != "ok" {
            return Err(SentimentError::NewsApi(format!(
                "{}: {}",
                envelope.code.as_deref().unwrap_or("error"),
                envelope.message.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(envelope.articles)
    }
}

impl SourceAdapter for NewsApiClient {
    fn name(&self) -> &str {
        NAME
    }

    fn source(&self) -> Source {
        Source::News
    }

    fn fetch<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<RawItem>, SentimentError>> {
        async move {
            self.search_everything(query, limit)
                .await
                .map_err(|e| e.into_unavailable(NAME))
        }
        .boxed()
    }
}
