//! Conversion of raw adapter records into [`ContentItem`]s.
//!
//! This is the only place that reads fields out of dynamically-shaped source
//! responses. Each source kind has a fixed list of field aliases so that
//! different adapters for the same kind (`NewsAPI` JSON, RSS) share one path.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::SentimentError;
use crate::types::{ContentItem, Source};

const NEWS_ID_FIELDS: &[&str] = &["id", "guid"];
const NEWS_BODY_FIELDS: &[&str] = &["description", "summary", "content"];
const NEWS_URL_FIELDS: &[&str] = &["url", "link"];
const NEWS_DATE_FIELDS: &[&str] = &["publishedAt", "pubDate", "published_at"];

const SOCIAL_ID_FIELDS: &[&str] = &["name", "id"];
const SOCIAL_BODY_FIELDS: &[&str] = &["selftext", "body"];
const SOCIAL_DATE_FIELDS: &[&str] = &["created_utc", "created"];

/// Placeholder bodies Reddit returns for moderated content.
const REMOVED_MARKERS: &[&str] = &["[deleted]", "[removed]"];

/// Items that survived normalization plus the ones that were dropped.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub items: Vec<ContentItem>,
    pub failures: Vec<(Source, SentimentError)>,
    /// Number of items collapsed as duplicates of an earlier `(source, id)`.
    pub duplicates: usize,
}

/// Normalize one raw record.
///
/// Missing optional fields become `None` (or an empty title). Only a record
/// that is not a JSON object, or whose title and body are both empty, fails.
///
/// # Errors
///
/// Returns [`SentimentError::Normalization`] when the record carries no
/// recoverable content.
pub fn normalize_item(source: Source, raw: &Value) -> Result<ContentItem, SentimentError> {
    if !raw.is_object() {
        return Err(SentimentError::Normalization(format!(
            "{source} record is not an object"
        )));
    }

    let item = match source {
        Source::News => normalize_news(raw),
        Source::SocialPost => normalize_social(raw),
    };

    if item.title.is_empty() && item.body.is_empty() {
        return Err(SentimentError::Normalization(format!(
            "{source} record has neither title nor body (id hint: {})",
            text_field(raw, &["id", "name", "url", "link"]).unwrap_or_else(|| "none".to_string())
        )));
    }

    Ok(item)
}

/// Normalize a batch of `(source, raw)` records in order.
///
/// Failures are logged and collected rather than propagated. Records whose
/// `(source, id)` was already seen in this batch are dropped, keeping the
/// first occurrence.
pub fn normalize_batch<I>(records: I) -> NormalizedBatch
where
    I: IntoIterator<Item = (Source, Value)>,
{
    let mut batch = NormalizedBatch::default();
    let mut seen: HashSet<(Source, String)> = HashSet::new();

    for (source, raw) in records {
        match normalize_item(source, &raw) {
            Ok(item) => {
                if seen.insert((item.source, item.id.clone())) {
                    batch.items.push(item);
                } else {
                    tracing::debug!(source = %source, id = %item.id, "dropping duplicate item");
                    batch.duplicates += 1;
                }
            }
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "dropping malformed item");
                batch.failures.push((source, e));
            }
        }
    }

    batch
}

fn normalize_news(raw: &Value) -> ContentItem {
    let title = text_field(raw, &["title"]).unwrap_or_default();
    let body = text_field(raw, NEWS_BODY_FIELDS)
        .map(|b| strip_html(&b))
        .unwrap_or_default();
    let url = text_field(raw, NEWS_URL_FIELDS);
    let published_at = timestamp_field(raw, NEWS_DATE_FIELDS);
    let outlet = raw
        .get("source")
        .and_then(|s| match s {
            Value::Object(_) => s.get("name").and_then(Value::as_str),
            Value::String(name) => Some(name.as_str()),
            _ => None,
        })
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty());

    let id = text_field(raw, NEWS_ID_FIELDS)
        .or_else(|| url.clone())
        .unwrap_or_else(|| derived_id(Source::News, &title, &body, published_at));

    build_item(Source::News, id, title, body, url, published_at, outlet)
}

fn normalize_social(raw: &Value) -> ContentItem {
    let title = text_field(raw, &["title"]).unwrap_or_default();
    let body = text_field(raw, SOCIAL_BODY_FIELDS)
        .filter(|b| !REMOVED_MARKERS.contains(&b.as_str()))
        .unwrap_or_default();
    let url = text_field(raw, &["permalink"])
        .map(|p| {
            if p.starts_with('/') {
                format!("https://www.reddit.com{p}")
            } else {
                p
            }
        })
        .or_else(|| text_field(raw, &["url"]));
    let published_at = timestamp_field(raw, SOCIAL_DATE_FIELDS);
    let outlet = text_field(raw, &["subreddit"]);

    let id = text_field(raw, SOCIAL_ID_FIELDS)
        .or_else(|| url.clone())
        .unwrap_or_else(|| derived_id(Source::SocialPost, &title, &body, published_at));

    build_item(Source::SocialPost, id, title, body, url, published_at, outlet)
}

fn build_item(
    source: Source,
    id: String,
    title: String,
    body: String,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    outlet: Option<String>,
) -> ContentItem {
    let mut item = ContentItem::new(source, id, title, body);
    item.url = url;
    item.published_at = published_at;
    item.outlet = outlet;
    item
}

/// First non-empty string among `keys`, whitespace collapsed.
///
/// Numbers are accepted too since some APIs send numeric ids.
fn text_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let value = match raw.get(*key)? {
            Value::String(s) => collapse_whitespace(s),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    })
}

fn timestamp_field(raw: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_f64().and_then(from_unix_seconds),
        _ => None,
    })
}

/// Parse RFC 3339, RFC 2822, or Unix-seconds strings. Anything else is `None`.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(from_unix_seconds))
}

fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = secs.trunc() as i64;
    Utc.timestamp_opt(whole, 0).single()
}

/// Stable fallback id for records without a source id or URL.
fn derived_id(
    source: Source,
    title: &str,
    body: &str,
    published_at: Option<DateTime<Utc>>,
) -> String {
    let stamp = published_at.map(|t| t.to_rfc3339()).unwrap_or_default();
    let digest = Sha256::digest(format!("{source}|{title}|{body}|{stamp}").as_bytes());
    let hex = format!("{digest:x}");
    format!("sha256:{}", &hex[..32])
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    collapse_whitespace(&out)
}
