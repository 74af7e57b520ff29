//! Aggregation of scored items into a [`BrandReport`].
//!
//! Everything here is a pure function of the input items (plus the explicit
//! `generated_at` in [`aggregate_at`]), so a report can be rebuilt exactly.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{
    BrandReport, ContentItem, SentimentLabel, Source, SourceSummary, TermCount, TrendPoint,
};

/// Maximum number of ranked items kept per source.
pub const TOP_ITEMS_PER_SOURCE: usize = 5;

/// Maximum number of terms kept for the word cloud.
pub const TOP_TERMS: usize = 30;

const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "his", "how", "its", "may", "new", "now", "old", "see",
    "two", "who", "did", "get", "got", "him", "let", "say", "she", "too", "use", "with", "this",
    "that", "from", "they", "will", "would", "there", "their", "what", "about", "which", "when",
    "were", "been", "than", "then", "them", "these", "those", "into", "just", "like", "more",
    "some", "such", "only", "other", "over", "also", "after", "before", "your", "here", "very",
    "could", "should", "does", "being", "because", "while", "where", "each", "most", "much",
    "many", "said", "says", "it's", "i'm", "don't", "doesn't", "http", "https", "www",
    "com", "amp", "nbsp", "chars",
];

/// Aggregate scored items into a report stamped with the current time.
#[must_use]
pub fn aggregate(query: &str, items: Vec<ContentItem>) -> BrandReport {
    aggregate_at(query, items, Utc::now())
}

/// Aggregate scored items into a report with an explicit timestamp.
///
/// Unscored items count as Neutral with score `0.0`. An empty input yields
/// all-zero counts and no top items.
#[must_use]
pub fn aggregate_at(
    query: &str,
    items: Vec<ContentItem>,
    generated_at: DateTime<Utc>,
) -> BrandReport {
    let mut counts_by_label: BTreeMap<SentimentLabel, usize> =
        SentimentLabel::ALL.iter().map(|l| (*l, 0)).collect();
    let mut counts_by_source: BTreeMap<Source, usize> =
        Source::ALL.iter().map(|s| (*s, 0)).collect();
    let mut totals: BTreeMap<Source, (SourceSummary, f64)> = Source::ALL
        .iter()
        .map(|s| (*s, (SourceSummary::default(), 0.0)))
        .collect();

    for item in &items {
        let label = item.label();
        *counts_by_label.entry(label).or_insert(0) += 1;
        *counts_by_source.entry(item.source).or_insert(0) += 1;

        let (summary, sum) = totals
            .entry(item.source)
            .or_insert_with(|| (SourceSummary::default(), 0.0));
        summary.count += 1;
        match label {
            SentimentLabel::Positive => summary.positive += 1,
            SentimentLabel::Negative => summary.negative += 1,
            SentimentLabel::Neutral => summary.neutral += 1,
        }
        *sum += f64::from(item.score());
    }

    let source_summaries = totals
        .into_iter()
        .map(|(source, (mut summary, sum))| {
            summary.average_score = mean(sum, summary.count);
            (source, summary)
        })
        .collect();

    BrandReport {
        query: query.to_string(),
        top_items: top_items(&items, TOP_ITEMS_PER_SOURCE),
        trend: trend(&items),
        top_terms: top_terms(query, &items, TOP_TERMS),
        items,
        counts_by_label,
        counts_by_source,
        source_summaries,
        generated_at,
    }
}

/// Ranking used for `top_items`: newest first (undated items last), then
/// larger absolute score first.
#[must_use]
pub fn compare_rank(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.score().abs().total_cmp(&a.score().abs()))
}

fn top_items(items: &[ContentItem], k: usize) -> BTreeMap<Source, Vec<ContentItem>> {
    let mut partitions: BTreeMap<Source, Vec<&ContentItem>> = BTreeMap::new();
    for item in items {
        partitions.entry(item.source).or_default().push(item);
    }

    partitions
        .into_iter()
        .map(|(source, mut group)| {
            // Stable sort keeps fetch order for full ties.
            group.sort_by(|a, b| compare_rank(a, b));
            let top = group.into_iter().take(k).cloned().collect();
            (source, top)
        })
        .collect()
}

fn trend(items: &[ContentItem]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<(NaiveDate, Source), (f64, usize)> = BTreeMap::new();
    for item in items {
        let Some(published_at) = item.published_at else {
            continue;
        };
        let bucket = buckets
            .entry((published_at.date_naive(), item.source))
            .or_insert((0.0, 0));
        bucket.0 += f64::from(item.score());
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|((date, source), (sum, count))| TrendPoint {
            date,
            source,
            average_score: mean(sum, count),
            count,
        })
        .collect()
}

fn top_terms(query: &str, items: &[ContentItem], limit: usize) -> Vec<TermCount> {
    let query_terms: HashSet<String> = tokenize(query).collect();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for item in items {
        for token in tokenize(&item.title).chain(tokenize(&item.body)) {
            if token.chars().count() < MIN_TERM_LEN
                || STOP_WORDS.contains(&token.as_str())
                || query_terms.contains(&token)
            {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    terms.truncate(limit);
    terms
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphabetic() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
}

fn mean(sum: f64, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let avg = (sum / count as f64) as f32;
    avg
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::SentimentResult;

    fn scored(source: Source, id: &str, score: f32) -> ContentItem {
        ContentItem::new(source, id, format!("title {id}"), "")
            .with_sentiment(SentimentResult::from_score(score))
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_yields_zero_counts() {
        let report = aggregate("Nike", Vec::new());
        assert!(report.items.is_empty());
        assert!(report.top_items.is_empty());
        assert!(report.trend.is_empty());
        assert!(report.top_terms.is_empty());
        for label in SentimentLabel::ALL {
            assert_eq!(report.label_count(label), 0);
        }
        for source in Source::ALL {
            assert_eq!(report.source_count(source), 0);
            assert!(report.summary(source).average_score.abs() < f32::EPSILON);
        }
    }

    #[test]
    fn mixed_scores_tally_by_label_and_source() {
        let items = vec![
            scored(Source::News, "n1", 0.8),
            scored(Source::News, "n2", -0.6),
            scored(Source::News, "n3", 0.0),
            scored(Source::SocialPost, "s1", 0.1),
            scored(Source::SocialPost, "s2", -0.9),
        ];
        let report = aggregate("Nike", items);

        assert_eq!(report.label_count(SentimentLabel::Positive), 2);
        assert_eq!(report.label_count(SentimentLabel::Negative), 2);
        assert_eq!(report.label_count(SentimentLabel::Neutral), 1);
        assert_eq!(report.source_count(Source::News), 3);
        assert_eq!(report.source_count(Source::SocialPost), 2);

        let label_total: usize = report.counts_by_label.values().sum();
        let source_total: usize = report.counts_by_source.values().sum();
        assert_eq!(label_total, report.items.len());
        assert_eq!(source_total, report.items.len());

        let news = report.summary(Source::News);
        assert_eq!((news.positive, news.negative, news.neutral), (1, 1, 1));
        assert!((news.average_score - (0.2 / 3.0)).abs() < 1e-6);
        let social = report.summary(Source::SocialPost);
        assert!((social.average_score - (-0.4)).abs() < 1e-6);
    }

    #[test]
    fn items_keep_input_order() {
        let items = vec![
            scored(Source::SocialPost, "s1", 0.1),
            scored(Source::News, "n1", 0.2),
            scored(Source::SocialPost, "s2", 0.3),
        ];
        let report = aggregate("q", items);
        let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "n1", "s2"]);
    }

    #[test]
    fn unscored_items_count_as_neutral() {
        let items = vec![ContentItem::new(Source::News, "raw", "t", "b")];
        let report = aggregate("q", items);
        assert_eq!(report.label_count(SentimentLabel::Neutral), 1);
    }

    #[test]
    fn top_items_rank_by_recency_then_absolute_score() {
        let items = vec![
            scored(Source::News, "undated-strong", -0.95),
            scored(Source::News, "old", 0.2).with_published_at(at(1, 9)),
            scored(Source::News, "new-weak", 0.1).with_published_at(at(3, 9)),
            scored(Source::News, "new-strong", -0.7).with_published_at(at(3, 9)),
            scored(Source::News, "mid", 0.0).with_published_at(at(2, 9)),
        ];
        let report = aggregate("q", items);
        let ids: Vec<&str> = report.top_items[&Source::News]
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["new-strong", "new-weak", "mid", "old", "undated-strong"]
        );
        assert!(!report.top_items.contains_key(&Source::SocialPost));
    }

    #[test]
    fn top_items_are_capped_and_sorted() {
        let items: Vec<ContentItem> = (0..12)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let score = (i as f32 - 6.0) / 10.0;
                scored(Source::SocialPost, &format!("p{i}"), score)
                    .with_published_at(at(1 + (i % 4), 12))
            })
            .collect();
        let report = aggregate("q", items);
        let top = &report.top_items[&Source::SocialPost];
        assert_eq!(top.len(), TOP_ITEMS_PER_SOURCE);
        for pair in top.windows(2) {
            assert_ne!(compare_rank(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn trend_groups_by_day_and_source() {
        let items = vec![
            scored(Source::News, "a", 0.4).with_published_at(at(1, 8)),
            scored(Source::News, "b", 0.2).with_published_at(at(1, 20)),
            scored(Source::SocialPost, "c", -0.5).with_published_at(at(1, 10)),
            scored(Source::News, "d", -0.3).with_published_at(at(2, 10)),
            scored(Source::News, "undated", 0.9),
        ];
        let report = aggregate("q", items);
        assert_eq!(report.trend.len(), 3);

        let first = &report.trend[0];
        assert_eq!(first.source, Source::News);
        assert_eq!(first.count, 2);
        assert!((first.average_score - 0.3).abs() < 1e-6);
        assert_eq!(report.trend[1].source, Source::SocialPost);
        assert_eq!(report.trend[2].date, at(2, 0).date_naive());
    }

    #[test]
    fn top_terms_skip_stop_words_and_query() {
        let items = vec![
            ContentItem::new(
                Source::News,
                "1",
                "Nike launches running shoes",
                "The shoes are light",
            ),
            ContentItem::new(
                Source::SocialPost,
                "2",
                "",
                "nike shoes feel great for running",
            ),
        ];
        let report = aggregate("Nike", items);
        let terms: Vec<(&str, usize)> = report
            .top_terms
            .iter()
            .map(|t| (t.term.as_str(), t.count))
            .collect();
        assert_eq!(terms[0], ("shoes", 3));
        assert_eq!(terms[1], ("running", 2));
        assert!(terms.iter().all(|(t, _)| *t != "nike" && *t != "the"));
    }

    #[test]
    fn aggregation_is_deterministic() {
        let items = vec![
            scored(Source::News, "a", 0.4).with_published_at(at(1, 8)),
            scored(Source::SocialPost, "b", -0.2),
        ];
        let stamp = at(5, 0);
        let first = aggregate_at("q", items.clone(), stamp);
        let second = aggregate_at("q", items, stamp);
        assert_eq!(first, second);
    }
}
