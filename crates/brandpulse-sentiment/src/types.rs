use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Scores strictly above this are labelled [`SentimentLabel::Positive`].
pub const POSITIVE_THRESHOLD: f32 = 0.05;

/// Scores strictly below this are labelled [`SentimentLabel::Negative`].
pub const NEGATIVE_THRESHOLD: f32 = -0.05;

/// Kind of content source an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    News,
    SocialPost,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::News, Source::SocialPost];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::News => "news",
            Source::SocialPost => "social_post",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// Derive the label for a polarity score using the fixed thresholds.
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score > POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score < NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

/// Polarity score in `[-1.0, 1.0]` and the label derived from it.
///
/// The label is never stored independently of the score: the only way to
/// build a result is [`SentimentResult::from_score`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentResult {
    label: SentimentLabel,
    score: f32,
}

impl SentimentResult {
    /// Build a result from a raw score. Non-finite scores become `0.0`;
    /// everything else is clamped to `[-1.0, 1.0]`.
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            label: SentimentLabel::from_score(score),
            score,
        }
    }

    #[must_use]
    pub fn neutral() -> Self {
        Self::from_score(0.0)
    }

    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        self.label
    }

    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }
}

/// A normalized article or post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub source: Source,
    /// Unique within one fetch batch and source.
    pub id: String,
    /// Empty when the upstream record had no title.
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Publisher name for news, subreddit for social posts.
    pub outlet: Option<String>,
    sentiment: Option<SentimentResult>,
}

impl ContentItem {
    #[must_use]
    pub fn new(
        source: Source,
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source,
            id: id.into(),
            title: title.into(),
            body: body.into(),
            url: None,
            published_at: None,
            outlet: None,
            sentiment: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    #[must_use]
    pub fn with_outlet(mut self, outlet: impl Into<String>) -> Self {
        self.outlet = Some(outlet.into());
        self
    }

    /// Attach the scoring result. Consumes the item so scoring happens once
    /// on the way from the scorer to the aggregator.
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: SentimentResult) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    #[must_use]
    pub fn sentiment(&self) -> Option<&SentimentResult> {
        self.sentiment.as_ref()
    }

    /// Score of the item, `0.0` while unscored.
    #[must_use]
    pub fn score(&self) -> f32 {
        self.sentiment.map_or(0.0, |s| s.score())
    }

    /// Label of the item, `Neutral` while unscored.
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        self.sentiment
            .map_or(SentimentLabel::Neutral, |s| s.label())
    }

    /// Text handed to the classifier: title and body with equal weight.
    #[must_use]
    pub fn scoring_text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

/// Per-source distribution and mean score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceSummary {
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Mean score over the source's items, `0.0` when there are none.
    pub average_score: f32,
}

/// Mean score for one source on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub source: Source,
    pub average_score: f32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Aggregate sentiment result for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandReport {
    pub query: String,
    /// In fetch order.
    pub items: Vec<ContentItem>,
    pub counts_by_label: BTreeMap<SentimentLabel, usize>,
    pub counts_by_source: BTreeMap<Source, usize>,
    /// Only sources present in `items` have an entry.
    pub top_items: BTreeMap<Source, Vec<ContentItem>>,
    pub source_summaries: BTreeMap<Source, SourceSummary>,
    pub trend: Vec<TrendPoint>,
    pub top_terms: Vec<TermCount>,
    pub generated_at: DateTime<Utc>,
}

impl BrandReport {
    #[must_use]
    pub fn label_count(&self, label: SentimentLabel) -> usize {
        self.counts_by_label.get(&label).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn source_count(&self, source: Source) -> usize {
        self.counts_by_source.get(&source).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn summary(&self, source: Source) -> SourceSummary {
        self.source_summaries
            .get(&source)
            .cloned()
            .unwrap_or_default()
    }
}
