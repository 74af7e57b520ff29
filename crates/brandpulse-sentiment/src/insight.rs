//! Narrative insight generation from a finished report.
//!
//! The report is always produced first; a narrative is an optional extra that
//! may fail on its own without affecting the report.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;
use crate::sources::{build_http_client, join_url, parse_base_url};
use crate::types::{BrandReport, Source};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/";
pub const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 300;

/// Turns a report summary into narrative text.
pub trait InsightGenerator: Send + Sync {
    fn summarize<'a>(&'a self, summary: &'a str) -> BoxFuture<'a, Result<String, SentimentError>>;
}

/// Render the summary text handed to the insight backend.
///
/// Lists the brand and, per source, the mean score and positive/negative
/// counts, then asks for recommendations.
#[must_use]
pub fn summary_prompt(report: &BrandReport) -> String {
    let mut prompt = format!("Brand: {}\n", report.query);
    for source in Source::ALL {
        let summary = report.summary(source);
        prompt.push_str(&format!(
            "\n{}:\nAvg Sentiment: {:.2}\nPositive: {}, Negative: {}\n",
            heading(source),
            summary.average_score,
            summary.positive,
            summary.negative
        ));
    }
    prompt.push_str("\nProvide a clear, concise insight & recommendations.");
    prompt
}

fn heading(source: Source) -> &'static str {
    match source {
        Source::News => "NEWS",
        Source::SocialPost => "SOCIAL",
    }
}

/// Generate a narrative for `report`.
///
/// # Errors
///
/// Returns [`SentimentError::Generation`] if the backend fails or returns
/// blank text.
pub async fn generate_insight(
    generator: &dyn InsightGenerator,
    report: &BrandReport,
) -> Result<String, SentimentError> {
    let prompt = summary_prompt(report);
    let text = generator.summarize(&prompt).await.map_err(|e| match e {
        SentimentError::Generation(_) => e,
        other => SentimentError::Generation(other.to_string()),
    })?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SentimentError::Generation(
            "backend returned an empty narrative".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Groq chat-completions client (`OpenAI`-compatible API).
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl GroqClient {
    /// Creates a client pointed at the production Groq API.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SentimentError::SourceUnavailable`] for an invalid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout_secs, None)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Send `prompt` as a single user message and return the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Generation`] on a non-2xx status, an
    /// unparseable body, or a response without completion text, and
    /// [`SentimentError::Http`] on network failure.
    pub async fn complete(&self, prompt: &str) -> Result<String, SentimentError> {
        let url = join_url(&self.base_url, "chat/completions")?;
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SentimentError::Generation(format!(
                "Groq returned HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| SentimentError::Generation(format!("unparseable completion: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(SentimentError::Generation(
                "completion contained no text".to_string(),
            ));
        }

        tracing::debug!(model = %self.model, chars = content.len(), "received Groq completion");
        Ok(content)
    }
}

impl InsightGenerator for GroqClient {
    fn summarize<'a>(&'a self, summary: &'a str) -> BoxFuture<'a, Result<String, SentimentError>> {
        self.complete(summary).boxed()
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
