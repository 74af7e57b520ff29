/// Client-credentials pair for the Reddit OAuth flow.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub news_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub reddit: Option<RedditCredentials>,
    pub reddit_user_agent: String,
    pub google_news_enabled: bool,
    pub groq_model: String,
    pub request_timeout_secs: u64,
    pub pipeline_timeout_secs: u64,
    pub max_news: usize,
    pub max_reddit: usize,
    pub classifier_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl AppConfig {
    /// Number of content sources that can be built from this configuration.
    #[must_use]
    pub fn configured_source_count(&self) -> usize {
        usize::from(self.news_api_key.is_some())
            + usize::from(self.google_news_enabled)
            + usize::from(self.reddit.is_some())
    }
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "groq_api_key",
                &self.groq_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit", &self.reddit)
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("google_news_enabled", &self.google_news_enabled)
            .field("groq_model", &self.groq_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .field("max_news", &self.max_news)
            .field("max_reddit", &self.max_reddit)
            .field("classifier_timeout_ms", &self.classifier_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}
