//! `report` command: wire adapters from config, run the pipeline, print.

use std::time::Duration;

use anyhow::Context;
use brandpulse_core::AppConfig;
use brandpulse_sentiment::{
    DateWindow, GoogleNewsRssClient, GroqClient, LexiconClassifier, NewsApiClient,
    PipelineSettings, RedditClient, ReportPipeline, RetryPolicy,
};
use chrono::{NaiveDate, Utc};
use clap::Args;

use crate::render::render_text;

/// Days covered by the news window when `--from` is omitted.
const DEFAULT_WINDOW_DAYS: u32 = 7;

const SCORING_CONCURRENCY: usize = 8;

#[derive(Debug, Args)]
pub(crate) struct ReportArgs {
    /// Brand name to search for
    #[arg(long)]
    pub(crate) brand: String,

    /// First publication date to include (YYYY-MM-DD); defaults to 7 days before --to
    #[arg(long)]
    pub(crate) from: Option<NaiveDate>,

    /// Last publication date to include (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub(crate) to: Option<NaiveDate>,

    /// Maximum news articles per news source (overrides `BRANDPULSE_MAX_NEWS`)
    #[arg(long)]
    pub(crate) max_news: Option<usize>,

    /// Maximum Reddit posts (overrides `BRANDPULSE_MAX_REDDIT`)
    #[arg(long)]
    pub(crate) max_reddit: Option<usize>,

    /// Overall deadline for building the report
    /// (overrides `BRANDPULSE_PIPELINE_TIMEOUT_SECS`)
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,

    /// Skip the AI-generated narrative
    #[arg(long)]
    pub(crate) no_insight: bool,

    /// Print the report, insight and diagnostics as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

/// Resolve the news date window from optional CLI bounds.
///
/// # Errors
///
/// Returns an error if `from` falls after `to`.
pub(crate) fn resolve_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> anyhow::Result<DateWindow> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or_else(|| DateWindow::last_days(DEFAULT_WINDOW_DAYS, to).from);
    if from > to {
        anyhow::bail!("--from {from} is after --to {to}");
    }
    Ok(DateWindow { from, to })
}

/// Build the pipeline for every source the configuration enables.
///
/// # Errors
///
/// Returns an error if no source is configured or an HTTP client cannot be
/// constructed.
pub(crate) fn build_pipeline(
    config: &AppConfig,
    args: &ReportArgs,
    window: DateWindow,
) -> anyhow::Result<ReportPipeline> {
    if config.configured_source_count() == 0 {
        anyhow::bail!(
            "no content sources configured; set NEWS_API_KEY, REDDIT_CLIENT_ID and \
             REDDIT_CLIENT_SECRET, or enable BRANDPULSE_GOOGLE_NEWS_ENABLED"
        );
    }

    let retry = RetryPolicy {
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    };
    let timeout = config.request_timeout_secs;
    let max_news = args.max_news.unwrap_or(config.max_news);
    let max_reddit = args.max_reddit.unwrap_or(config.max_reddit);

    let mut pipeline = ReportPipeline::new(Box::new(LexiconClassifier)).with_settings(
        PipelineSettings {
            classifier_timeout: Duration::from_millis(config.classifier_timeout_ms),
            scoring_concurrency: SCORING_CONCURRENCY,
        },
    );

    if let Some(key) = config.news_api_key.as_deref() {
        let client = NewsApiClient::new(key, timeout)
            .context("failed to build NewsAPI client")?
            .with_window(window)
            .with_retry(retry);
        pipeline = pipeline.with_adapter_limit(Box::new(client), max_news);
    }

    if config.google_news_enabled {
        let client = GoogleNewsRssClient::new(timeout)
            .context("failed to build Google News client")?
            .with_retry(retry);
        pipeline = pipeline.with_adapter_limit(Box::new(client), max_news);
    }

    if let Some(reddit) = &config.reddit {
        let client = RedditClient::new(
            &reddit.client_id,
            &reddit.client_secret,
            &config.reddit_user_agent,
            timeout,
        )
        .context("failed to build Reddit client")?
        .with_retry(retry);
        pipeline = pipeline.with_adapter_limit(Box::new(client), max_reddit);
    }

    if !args.no_insight {
        if let Some(key) = config.groq_api_key.as_deref() {
            let client = GroqClient::new(key, &config.groq_model, timeout)
                .context("failed to build Groq client")?;
            pipeline = pipeline.with_insight(Box::new(client));
        }
    }

    Ok(pipeline)
}

/// Run the `report` command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, no source is configured,
/// or every source fails.
pub(crate) async fn run_report(config: &AppConfig, args: &ReportArgs) -> anyhow::Result<()> {
    let brand = args.brand.trim();
    if brand.is_empty() {
        anyhow::bail!("--brand must not be empty");
    }

    let window = resolve_window(args.from, args.to, Utc::now().date_naive())?;
    let pipeline = build_pipeline(config, args, window)?;
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(config.pipeline_timeout_secs));

    tracing::info!(
        brand,
        sources = ?pipeline.adapter_names(),
        from = %window.from,
        to = %window.to,
        "building report"
    );

    let per_source_limit = args.max_news.unwrap_or(config.max_news);
    let outcome = pipeline
        .build_report(brand, per_source_limit, timeout)
        .await
        .with_context(|| format!("failed to build report for '{brand}'"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_text(&outcome, Some(&window)));
    }

    Ok(())
}
