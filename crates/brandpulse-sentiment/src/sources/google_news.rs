//! Google News RSS search adapter. Needs no credentials.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;

use super::rss_helpers::parse_rss_items;
use super::{build_http_client, join_url, parse_base_url, RawItem, SourceAdapter};
use crate::error::SentimentError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::Source;

const DEFAULT_BASE_URL: &str = "https://news.google.com/";
const NAME: &str = "google_news_rss";

/// Client for the Google News RSS search feed.
pub struct GoogleNewsRssClient {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl GoogleNewsRssClient {
    /// Creates a client pointed at the production feed.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, SentimentError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SentimentError::SourceUnavailable`] for an invalid URL.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout_secs, None)?,
            base_url: parse_base_url(base_url)?,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch up to `limit` feed items for `query`.
    ///
    /// A body that is not an RSS/Atom document yields no items rather than
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] on network failure or a non-2xx
    /// status, or [`SentimentError::Xml`] on malformed RSS.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, SentimentError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = join_url(&self.base_url, "rss/search")?;
        let params = [
            ("q", query),
            ("hl", "en-US"),
            ("gl", "US"),
            ("ceid", "US:en"),
        ];

        let body = retry_with_backoff(self.retry, NAME, || self.fetch_feed(&url, &params)).await?;

        if !body.contains("<rss") && !body.contains("<feed") {
            tracing::debug!(query, "Google News returned a non-RSS body");
            return Ok(Vec::new());
        }

        let items = parse_rss_items(&body, limit)?;
        tracing::debug!(query, count = items.len(), "fetched Google News RSS items");
        Ok(items)
    }

    async fn fetch_feed(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<String, SentimentError> {
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

impl SourceAdapter for GoogleNewsRssClient {
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
            self.search(query, limit)
                .await
                .map_err(|e| e.into_unavailable(NAME))
        }
        .boxed()
    }
}
