//! End-to-end `ReportPipeline` scenarios with in-process adapters.

use std::time::Duration;

use brandpulse_sentiment::{
    Classifier, Diagnostic, InsightGenerator, LexiconClassifier, NewsApiClient, PipelineSettings,
    RawItem, ReportPipeline, RetryPolicy, SentimentError, SentimentLabel, Source, SourceAdapter,
};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns fixed records after an optional delay.
struct StaticAdapter {
    name: &'static str,
    source: Source,
    delay: Duration,
    records: Vec<RawItem>,
}

impl StaticAdapter {
    fn new(name: &'static str, source: Source, records: Vec<RawItem>) -> Self {
        Self {
            name,
            source,
            delay: Duration::ZERO,
            records,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn source(&self) -> Source {
        self.source
    }

    fn fetch<'a>(
        &'a self,
        _query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<RawItem>, SentimentError>> {
        async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.records.iter().take(limit).cloned().collect())
        }
        .boxed()
    }
}

struct FailingAdapter(&'static str);

impl SourceAdapter for FailingAdapter {
    fn name(&self) -> &str {
        self.0
    }

    fn source(&self) -> Source {
        Source::News
    }

    fn fetch<'a>(
        &'a self,
        _query: &'a str,
        _limit: usize,
    ) -> BoxFuture<'a, Result<Vec<RawItem>, SentimentError>> {
        future::ready(Err(SentimentError::SourceUnavailable {
            source_name: self.0.to_string(),
            reason: "connection refused".to_string(),
        }))
        .boxed()
    }
}

/// Scores text by looking up a number in it; `slow` never answers in time.
struct ScriptedClassifier;

impl Classifier for ScriptedClassifier {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<f32, SentimentError>> {
        async move {
            if text.contains("slow") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            let score = text
                .split_whitespace()
                .find_map(|w| w.parse::<f32>().ok())
                .unwrap_or(0.0);
            Ok(score)
        }
        .boxed()
    }
}

/// Takes a fixed time per item before answering.
struct PacedClassifier(Duration);

impl Classifier for PacedClassifier {
    fn classify<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<f32, SentimentError>> {
        async move {
            tokio::time::sleep(self.0).await;
            Ok(0.5)
        }
        .boxed()
    }
}

/// Answers only after a fixed delay.
struct SlowInsight(Duration);

impl InsightGenerator for SlowInsight {
    fn summarize<'a>(
        &'a self,
        _summary: &'a str,
    ) -> BoxFuture<'a, Result<String, SentimentError>> {
        async move {
            tokio::time::sleep(self.0).await;
            Ok("late narrative".to_string())
        }
        .boxed()
    }
}

struct CannedInsight(Result<&'static str, &'static str>);

impl InsightGenerator for CannedInsight {
    fn summarize<'a>(
        &'a self,
        _summary: &'a str,
    ) -> BoxFuture<'a, Result<String, SentimentError>> {
        let result = match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(reason) => Err(SentimentError::Generation(reason.to_string())),
        };
        future::ready(result).boxed()
    }
}

fn news(id: &str, title: &str) -> RawItem {
    json!({ "id": id, "title": title, "description": "" })
}

fn post(id: &str, title: &str) -> RawItem {
    json!({ "name": id, "title": title, "selftext": "" })
}

fn scripted_settings() -> PipelineSettings {
    PipelineSettings {
        classifier_timeout: Duration::from_millis(100),
        scoring_concurrency: 4,
    }
}

#[tokio::test]
async fn one_failed_source_still_produces_report() {
    let records = (0..5)
        .map(|i| news(&format!("n{i}"), &format!("Nike story {i}")))
        .collect();
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(FailingAdapter("broken")))
        .with_adapter(Box::new(StaticAdapter::new("static", Source::News, records)));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .expect("one working source is enough");

    assert_eq!(outcome.report.items.len(), 5);
    assert_eq!(outcome.diagnostics.failed_sources(), vec!["broken"]);
    assert_eq!(
        outcome.diagnostics.entries[0],
        Diagnostic::SourceUnavailable {
            source_name: "broken".to_string(),
            reason: "connection refused".to_string(),
        }
    );
    assert_eq!(
        outcome.diagnostics.coverage(),
        "1 of 2 sources returned results"
    );
}

#[tokio::test]
async fn all_sources_failing_is_fatal() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(FailingAdapter("first")))
        .with_adapter(Box::new(FailingAdapter("second")));

    let err = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        SentimentError::AllSourcesFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].contains("first"));
            assert!(failures[1].contains("second"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn scores_and_counts_mixed_sources() {
    let pipeline = ReportPipeline::new(Box::new(ScriptedClassifier))
        .with_settings(scripted_settings())
        .with_adapter(Box::new(StaticAdapter::new(
            "news",
            Source::News,
            vec![news("n1", "0.8"), news("n2", "-0.6"), news("n3", "0.0")],
        )))
        .with_adapter(Box::new(StaticAdapter::new(
            "social",
            Source::SocialPost,
            vec![post("s1", "0.1"), post("s2", "-0.9")],
        )));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();
    let report = &outcome.report;

    assert_eq!(report.label_count(SentimentLabel::Positive), 2);
    assert_eq!(report.label_count(SentimentLabel::Negative), 2);
    assert_eq!(report.label_count(SentimentLabel::Neutral), 1);
    assert_eq!(report.source_count(Source::News), 3);
    assert_eq!(report.source_count(Source::SocialPost), 2);
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn items_follow_registration_order_not_completion_order() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(
            StaticAdapter::new(
                "slow",
                Source::News,
                vec![news("a1", "first a"), news("a2", "second a")],
            )
            .delayed(Duration::from_millis(50)),
        ))
        .with_adapter(Box::new(StaticAdapter::new(
            "fast",
            Source::SocialPost,
            vec![post("b1", "first b")],
        )));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.report.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "b1"]);
}

#[tokio::test]
async fn source_past_deadline_is_recorded_as_timed_out() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(
            StaticAdapter::new("hung", Source::News, vec![news("h1", "never arrives")])
                .delayed(Duration::from_secs(30)),
        ))
        .with_adapter(Box::new(StaticAdapter::new(
            "quick",
            Source::SocialPost,
            vec![post("q1", "arrives")],
        )));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_millis(100))
        .await
        .unwrap();

    assert_eq!(outcome.report.items.len(), 1);
    assert_eq!(outcome.report.items[0].id, "q1");
    match &outcome.diagnostics.entries[0] {
        Diagnostic::SourceUnavailable {
            source_name,
            reason,
        } => {
            assert_eq!(source_name, "hung");
            assert!(reason.contains("timed out"));
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[tokio::test]
async fn classifier_timeout_degrades_one_item() {
    let mut records: Vec<RawItem> = (1..=9)
        .map(|i| news(&format!("n{i}"), &format!("0.{i}")))
        .collect();
    records.insert(4, news("stuck", "slow 0.9"));

    let pipeline = ReportPipeline::new(Box::new(ScriptedClassifier))
        .with_settings(scripted_settings())
        .with_adapter(Box::new(StaticAdapter::new("news", Source::News, records)));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();

    let items = &outcome.report.items;
    assert_eq!(items.len(), 10);
    let stuck = items.iter().find(|i| i.id == "stuck").unwrap();
    assert!(stuck.score().abs() < f32::EPSILON);
    assert_eq!(stuck.label(), SentimentLabel::Neutral);
    assert_eq!(
        items
            .iter()
            .filter(|i| i.label() == SentimentLabel::Positive)
            .count(),
        9
    );
    assert_eq!(outcome.diagnostics.classifier_error_count(), 1);
}

#[tokio::test]
async fn overall_timeout_bounds_scoring_and_insight() {
    let records = (0..5)
        .map(|i| news(&format!("n{i}"), &format!("Nike story {i}")))
        .collect();
    let pipeline = ReportPipeline::new(Box::new(PacedClassifier(Duration::from_millis(300))))
        .with_settings(PipelineSettings {
            classifier_timeout: Duration::from_secs(2),
            scoring_concurrency: 1,
        })
        .with_adapter(Box::new(StaticAdapter::new("news", Source::News, records)))
        .with_insight(Box::new(SlowInsight(Duration::from_secs(2))));

    let started = std::time::Instant::now();
    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_millis(100))
        .await
        .unwrap();

    assert!(
        started.elapsed() < Duration::from_secs(1),
        "took {:?}",
        started.elapsed()
    );
    assert_eq!(outcome.report.items.len(), 5);
    for item in &outcome.report.items {
        assert_eq!(item.label(), SentimentLabel::Neutral);
    }
    assert_eq!(outcome.diagnostics.classifier_error_count(), 5);
    assert!(outcome.insight.is_none());
    assert!(outcome.diagnostics.generation_failed());
}

#[tokio::test]
async fn insight_failure_keeps_report() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(StaticAdapter::new(
            "news",
            Source::News,
            vec![news("n1", "Nike wins award")],
        )))
        .with_insight(Box::new(CannedInsight(Err("rate limited"))));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.report.items.len(), 1);
    assert!(outcome.insight.is_none());
    assert!(outcome.diagnostics.generation_failed());
}

#[tokio::test]
async fn insight_success_is_attached() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(StaticAdapter::new(
            "news",
            Source::News,
            vec![news("n1", "Nike wins award")],
        )))
        .with_insight(Box::new(CannedInsight(Ok("Coverage is favourable."))));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.insight.as_deref(), Some("Coverage is favourable."));
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn http_adapter_failure_is_partial_coverage() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyMissing",
            "message": "Your API key is missing."
        })))
        .mount(&server)
        .await;

    let newsapi = NewsApiClient::with_base_url("", 5, &server.uri())
        .unwrap()
        .with_retry(RetryPolicy::none());
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier))
        .with_adapter(Box::new(newsapi))
        .with_adapter(Box::new(StaticAdapter::new(
            "social",
            Source::SocialPost,
            vec![post("s1", "Nike is great")],
        )));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(outcome.report.items.len(), 1);
    assert_eq!(outcome.diagnostics.failed_sources(), vec!["newsapi"]);
}

#[tokio::test]
async fn outcome_serializes_to_json() {
    let pipeline = ReportPipeline::new(Box::new(LexiconClassifier)).with_adapter(Box::new(
        StaticAdapter::new("news", Source::News, vec![news("n1", "Nike wins award")]),
    ));

    let outcome = pipeline
        .build_report("Nike", 10, Duration::from_secs(5))
        .await
        .unwrap();
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["report"]["query"], "Nike");
    assert_eq!(value["report"]["items"][0]["source"], "news");
    assert!(value["insight"].is_null());
    assert_eq!(value["diagnostics"]["sources_attempted"], 1);
}
