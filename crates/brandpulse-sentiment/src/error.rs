use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("NewsAPI error: {0}")]
    NewsApi(String),

    #[error("Reddit API error: {0}")]
    Reddit(String),

    #[error("source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("normalization error: {0}")]
    Normalization(String),

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("insight generation error: {0}")]
    Generation(String),

    #[error("all {} sources failed: {}", failures.len(), failures.join("; "))]
    AllSourcesFailed { failures: Vec<String> },
}

impl SentimentError {
    /// Wrap any adapter-level failure as [`SentimentError::SourceUnavailable`].
    ///
    /// Errors that already are `SourceUnavailable` pass through unchanged.
    #[must_use]
    pub fn into_unavailable(self, source_name: &str) -> Self {
        match self {
            Self::SourceUnavailable { .. } => self,
            other => Self::SourceUnavailable {
                source_name: source_name.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
