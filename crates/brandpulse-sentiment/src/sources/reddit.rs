//! Reddit search adapter (client-credentials OAuth).

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::Deserialize;

use super::{build_http_client, join_url, parse_base_url, RawItem, SourceAdapter};
use crate::error::SentimentError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::Source;

const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com/";
const NAME: &str = "reddit";

/// Largest `limit` the search listing accepts.
const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawItem,
}

/// Reddit API client. A fresh app-only token is requested per fetch.
pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    auth_url: Url,
    api_base: Url,
    retry: RetryPolicy,
}

impl RedditClient {
    /// Creates a client pointed at the production Reddit endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, SentimentError> {
        Self::with_endpoints(
            client_id,
            client_secret,
            user_agent,
            timeout_secs,
            DEFAULT_AUTH_URL,
            DEFAULT_API_BASE,
        )
    }

    /// Creates a client with custom token and API endpoints (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SentimentError::SourceUnavailable`] for an invalid URL.
    pub fn with_endpoints(
        client_id: &str,
        client_secret: &str,
        user_agent: &str,
        timeout_secs: u64,
        auth_url: &str,
        api_base: &str,
    ) -> Result<Self, SentimentError> {
        let auth_url = Url::parse(auth_url).map_err(|e| SentimentError::SourceUnavailable {
            source_name: "config".to_string(),
            reason: format!("invalid Reddit auth URL '{auth_url}': {e}"),
        })?;
        Ok(Self {
            client: build_http_client(timeout_secs, Some(user_agent))?,
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            user_agent: user_agent.to_owned(),
            auth_url,
            api_base: parse_base_url(api_base)?,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Search all of Reddit for link posts matching `query`, newest first.
    ///
    /// Returns the `data` object of each listing child.
    ///
    /// # Errors
    ///
    /// - [`SentimentError::Reddit`] if the token exchange is rejected.
    /// - [`SentimentError::Http`] on network failure or a non-2xx search status.
    /// - [`SentimentError::Deserialize`] if the listing is not the expected shape.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, SentimentError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let token = retry_with_backoff(self.retry, NAME, || self.fetch_token()).await?;

        let url = join_url(&self.api_base, "r/all/search")?;
        let params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("sort", "new".to_string()),
            ("limit", limit.min(MAX_PAGE_LIMIT).to_string()),
            ("type", "link".to_string()),
            ("raw_json", "1".to_string()),
        ];

        let mut posts =
            retry_with_backoff(self.retry, NAME, || self.fetch_listing(&url, &params, &token))
                .await?;
        posts.truncate(limit);

        tracing::debug!(query, count = posts.len(), "fetched Reddit posts");
        Ok(posts)
    }

    async fn fetch_token(&self) -> Result<String, SentimentError> {
        let response = self
            .client
            .post(self.auth_url.clone())
            .header("User-Agent", &self.user_agent)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            response.error_for_status_ref()?;
        }
        if !status.is_success() {
            return Err(SentimentError::Reddit(format!(
                "token exchange failed with status {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Reddit(format!("token parse error: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_listing(
        &self,
        url: &Url,
        params: &[(&str, String)],
        token: &str,
    ) -> Result<Vec<RawItem>, SentimentError> {
        let body = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| SentimentError::Deserialize {
                context: "reddit search listing".to_string(),
                source: e,
            })?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}

impl SourceAdapter for RedditClient {
    fn name(&self) -> &str {
        NAME
    }

    fn source(&self) -> Source {
        Source::SocialPost
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
