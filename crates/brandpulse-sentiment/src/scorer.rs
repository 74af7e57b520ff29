//! Sentiment scoring: the classifier capability, the shipped lexicon backend,
//! and batch scoring with per-item failure isolation.

use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::error::SentimentError;
use crate::types::{ContentItem, SentimentResult};

/// Capability to turn text into a polarity score in `[-1.0, 1.0]`.
///
/// Implementations may be local (lexicon) or remote (model server); callers
/// only see this method. The label is always derived from the score.
pub trait Classifier: Send + Sync {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<f32, SentimentError>>;
}

/// Word weights for brand and product sentiment.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("positive", 0.4),
    ("love", 0.5),
    ("loved", 0.5),
    ("loves", 0.5),
    ("best", 0.5),
    ("better", 0.3),
    ("recommend", 0.4),
    ("quality", 0.3),
    ("reliable", 0.4),
    ("innovative", 0.4),
    ("popular", 0.3),
    ("growing", 0.3),
    ("growth", 0.3),
    ("record", 0.3),
    ("strong", 0.3),
    ("success", 0.4),
    ("successful", 0.4),
    ("thriving", 0.5),
    ("win", 0.4),
    ("wins", 0.4),
    ("happy", 0.4),
    ("impressive", 0.4),
    ("comfortable", 0.3),
    ("beautiful", 0.4),
    ("praise", 0.4),
    ("praised", 0.4),
    ("boost", 0.3),
    ("surge", 0.3),
    ("rose", 0.2),
    ("gain", 0.3),
    ("gains", 0.3),
    // Negative signals
    ("bad", -0.4),
    ("poor", -0.4),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("worst", -0.6),
    ("hate", -0.5),
    ("hated", -0.5),
    ("disappointing", -0.5),
    ("disappointed", -0.5),
    ("broken", -0.4),
    ("failed", -0.4),
    ("failure", -0.4),
    ("problem", -0.3),
    ("problems", -0.3),
    ("issue", -0.2),
    ("issues", -0.2),
    ("concern", -0.3),
    ("concerns", -0.3),
    ("warning", -0.4),
    ("recall", -0.7),
    ("lawsuit", -0.5),
    ("sued", -0.5),
    ("scandal", -0.6),
    ("boycott", -0.6),
    ("layoffs", -0.5),
    ("decline", -0.3),
    ("drop", -0.3),
    ("fell", -0.2),
    ("loss", -0.4),
    ("losses", -0.4),
    ("weak", -0.3),
    ("dangerous", -0.6),
    ("fraud", -0.7),
    ("overpriced", -0.4),
    ("scam", -0.7),
    ("crisis", -0.5),
];

/// Words that flip the polarity of the next two tokens.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "hardly", "isn't", "wasn't", "aren't", "don't", "doesn't",
    "didn't", "can't", "won't", "without",
];

/// Words that amplify the weight of the token that follows.
const INTENSIFIERS: &[(&str, f32)] = &[
    ("very", 1.5),
    ("really", 1.3),
    ("extremely", 1.8),
    ("super", 1.4),
    ("so", 1.2),
    ("incredibly", 1.8),
    ("slightly", 0.5),
];

/// How many tokens after a negator are flipped.
const NEGATION_WINDOW: usize = 2;

/// Score a text string using the lexicon.
///
/// Splits text into lowercase words and sums matching weights. A word within
/// [`NEGATION_WINDOW`] tokens after a negator has its sign flipped; a word
/// directly after an intensifier is scaled. The result is clamped to
/// `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase()
                .replace('\u{2019}', "'")
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 0.0_f32;
    let mut negate_remaining = 0usize;
    let mut multiplier = 1.0_f32;

    for w in &words {
        if NEGATORS.contains(&w.as_str()) {
            negate_remaining = NEGATION_WINDOW;
            continue;
        }
        if let Some(&(_, factor)) = INTENSIFIERS.iter().find(|(iw, _)| *iw == w.as_str()) {
            multiplier = factor;
            continue;
        }

        if let Some(&(_, weight)) = LEXICON.iter().find(|(lw, _)| *lw == w.as_str()) {
            let signed = if negate_remaining > 0 { -weight } else { weight };
            score += signed * multiplier;
        }

        multiplier = 1.0;
        negate_remaining = negate_remaining.saturating_sub(1);
    }

    score.clamp(-1.0, 1.0)
}

/// Local lexicon-backed [`Classifier`]. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

impl Classifier for LexiconClassifier {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<f32, SentimentError>> {
        future::ready(Ok(lexicon_score(text))).boxed()
    }
}

/// Scored items plus the ids whose classification failed.
#[derive(Debug, Default)]
pub struct ScoredBatch {
    /// Same order as the input.
    pub items: Vec<ContentItem>,
    pub failures: Vec<(String, SentimentError)>,
}

/// Score one item.
///
/// Empty text is Neutral/0.0 without calling the classifier. A classifier
/// error or a call exceeding `timeout` also yields Neutral/0.0, and the error
/// is returned alongside the item.
pub async fn score_item(
    classifier: &dyn Classifier,
    item: ContentItem,
    timeout: Duration,
) -> (ContentItem, Option<SentimentError>) {
    score_item_until(classifier, item, timeout, None).await
}

async fn score_item_until(
    classifier: &dyn Classifier,
    item: ContentItem,
    timeout: Duration,
    deadline: Option<Instant>,
) -> (ContentItem, Option<SentimentError>) {
    let text = item.scoring_text();
    if text.is_empty() {
        return (item.with_sentiment(SentimentResult::neutral()), None);
    }

    let per_item = Instant::now() + timeout;
    let (limit, cut_by_deadline) = match deadline {
        Some(deadline) if deadline < per_item => (deadline, true),
        _ => (per_item, false),
    };

    let outcome = match tokio::time::timeout_at(limit, classifier.classify(&text)).await {
        Ok(result) => result,
        Err(_) if cut_by_deadline => Err(SentimentError::Classifier(
            "deadline reached before the item was scored".to_string(),
        )),
        Err(_) => Err(SentimentError::Classifier(format!(
            "classifier timed out after {}ms",
            timeout.as_millis()
        ))),
    };

    match outcome {
        Ok(score) => (item.with_sentiment(SentimentResult::from_score(score)), None),
        Err(e) => {
            tracing::warn!(item = %item.id, error = %e, "classifier failed, scoring item neutral");
            (item.with_sentiment(SentimentResult::neutral()), Some(e))
        }
    }
}

/// Score every item with up to `concurrency` classifications in flight.
///
/// Output order matches input order regardless of completion order.
pub async fn score_items(
    classifier: &dyn Classifier,
    items: Vec<ContentItem>,
    timeout: Duration,
    concurrency: usize,
) -> ScoredBatch {
    score_batch(classifier, items, timeout, None, concurrency).await
}

/// Like [`score_items`], but no classification may run past `deadline`.
///
/// Items still unscored when the deadline passes are Neutral/0.0 and reported
/// as classifier failures.
pub async fn score_items_until(
    classifier: &dyn Classifier,
    items: Vec<ContentItem>,
    timeout: Duration,
    deadline: Instant,
    concurrency: usize,
) -> ScoredBatch {
    score_batch(classifier, items, timeout, Some(deadline), concurrency).await
}

async fn score_batch(
    classifier: &dyn Classifier,
    items: Vec<ContentItem>,
    timeout: Duration,
    deadline: Option<Instant>,
    concurrency: usize,
) -> ScoredBatch {
    let results: Vec<(ContentItem, Option<SentimentError>)> = stream::iter(items)
        .map(|item| score_item_until(classifier, item, timeout, deadline))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut batch = ScoredBatch {
        items: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (item, err) in results {
        if let Some(e) = err {
            batch.failures.push((item.id.clone(), e));
        }
        batch.items.push(item);
    }
    batch
}
