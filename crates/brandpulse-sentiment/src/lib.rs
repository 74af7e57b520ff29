//! Brand reputation pipeline for `BrandPulse`.
//!
//! Fetches news articles and social posts about a brand from pluggable source
//! adapters (`NewsAPI`, Google News RSS, Reddit), normalizes them into
//! [`ContentItem`]s, scores their sentiment with a [`Classifier`], and
//! aggregates everything into a [`BrandReport`]. An optional
//! [`InsightGenerator`] turns the report into a short narrative.
//!
//! Failures of individual sources, records, classifications or the narrative
//! are recovered and returned as [`Diagnostics`]; only a run in which every
//! source fails is an error.

pub mod aggregate;
pub mod diagnostics;
pub mod error;
pub mod insight;
pub mod normalize;
pub mod pipeline;
pub mod retry;
pub mod scorer;
pub mod sources;
pub mod types;

pub use aggregate::{aggregate, aggregate_at};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::SentimentError;
pub use insight::{generate_insight, summary_prompt, GroqClient, InsightGenerator};
pub use normalize::{normalize_batch, normalize_item, NormalizedBatch};
pub use pipeline::{PipelineSettings, ReportOutcome, ReportPipeline};
pub use retry::RetryPolicy;
pub use scorer::{
    lexicon_score, score_item, score_items, score_items_until, Classifier, LexiconClassifier,
};
pub use sources::{
    DateWindow, GoogleNewsRssClient, NewsApiClient, RawItem, RedditClient, SourceAdapter,
};
pub use types::{
    BrandReport, ContentItem, SentimentLabel, SentimentResult, Source, SourceSummary, TermCount,
    TrendPoint,
};
