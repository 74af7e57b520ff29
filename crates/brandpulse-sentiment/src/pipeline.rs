//! Report pipeline orchestration.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;

use crate::aggregate::aggregate;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::SentimentError;
use crate::insight::{generate_insight, InsightGenerator};
use crate::normalize::normalize_batch;
use crate::scorer::{score_items_until, Classifier};
use crate::sources::{RawItem, SourceAdapter};
use crate::types::{BrandReport, Source};

/// Tuning knobs for the scoring stage.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Per-item classifier deadline.
    pub classifier_timeout: Duration,
    /// Maximum classifications in flight.
    pub scoring_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            classifier_timeout: Duration::from_millis(2000),
            scoring_concurrency: 8,
        }
    }
}

/// A finished report with its optional narrative and recovered failures.
#[derive(Debug, Serialize)]
pub struct ReportOutcome {
    pub report: BrandReport,
    pub insight: Option<String>,
    pub diagnostics: Diagnostics,
}

struct RegisteredAdapter {
    adapter: Box<dyn SourceAdapter>,
    limit: Option<usize>,
}

/// Source adapters, a classifier, and an optional insight backend wired into
/// one `build_report` call.
pub struct ReportPipeline {
    adapters: Vec<RegisteredAdapter>,
    classifier: Box<dyn Classifier>,
    insight: Option<Box<dyn InsightGenerator>>,
    settings: PipelineSettings,
}

impl ReportPipeline {
    #[must_use]
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self {
            adapters: Vec::new(),
            classifier,
            insight: None,
            settings: PipelineSettings::default(),
        }
    }

    /// Register an adapter that uses the per-call `per_source_limit`.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Box<dyn SourceAdapter>) -> Self {
        self.adapters.push(RegisteredAdapter {
            adapter,
            limit: None,
        });
        self
    }

    /// Register an adapter with its own fixed item limit.
    #[must_use]
    pub fn with_adapter_limit(mut self, adapter: Box<dyn SourceAdapter>, limit: usize) -> Self {
        self.adapters.push(RegisteredAdapter {
            adapter,
            limit: Some(limit),
        });
        self
    }

    #[must_use]
    pub fn with_insight(mut self, generator: Box<dyn InsightGenerator>) -> Self {
        self.insight = Some(generator);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Names of the registered adapters, in registration order.
    #[must_use]
    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|r| r.adapter.name()).collect()
    }

    /// Fetch, normalize, score and aggregate everything known about `query`.
    ///
    /// `timeout` bounds the whole call, measured from entry.
    ///
    /// 1. Every adapter is fetched concurrently; any adapter that has not
    ///    answered before the deadline is recorded as unavailable.
    /// 2. Raw records are normalized in registration order, then response
    ///    order, and deduplicated.
    /// 3. Items are scored with bounded concurrency. Items still unscored at
    ///    the deadline are scored neutral.
    /// 4. The report is aggregated and, if an insight backend is registered,
    ///    a narrative is requested. A narrative not ready by the deadline is
    ///    dropped.
    ///
    /// Source, normalization, classifier and generation failures are
    /// recovered and recorded in [`ReportOutcome::diagnostics`].
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::AllSourcesFailed`] when no adapter is
    /// registered or every adapter failed.
    pub async fn build_report(
        &self,
        query: &str,
        per_source_limit: usize,
        timeout: Duration,
    ) -> Result<ReportOutcome, SentimentError> {
        if self.adapters.is_empty() {
            return Err(SentimentError::AllSourcesFailed {
                failures: Vec::new(),
            });
        }
        let mut diagnostics = Diagnostics::new(self.adapters.len());

        let deadline = Instant::now() + timeout;
        let fetches = self.adapters.iter().map(|registered| async move {
            let limit = registered.limit.unwrap_or(per_source_limit);
            let adapter = registered.adapter.as_ref();
            match tokio::time::timeout_at(deadline, adapter.fetch(query, limit)).await {
                Ok(result) => result.map_err(|e| e.into_unavailable(adapter.name())),
                Err(_) => Err(SentimentError::SourceUnavailable {
                    source_name: adapter.name().to_string(),
                    reason: format!("timed out after {}ms", timeout.as_millis()),
                }),
            }
        });
        let results = join_all(fetches).await;

        let mut raw: Vec<(Source, RawItem)> = Vec::new();
        let mut failures: Vec<String> = Vec::new();
        for (registered, result) in self.adapters.iter().zip(results) {
            let adapter = registered.adapter.as_ref();
            match result {
                Ok(records) => {
                    tracing::debug!(
                        source = adapter.name(),
                        count = records.len(),
                        "source returned records"
                    );
                    let kind = adapter.source();
                    raw.extend(records.into_iter().map(|r| (kind, r)));
                }
                Err(e) => {
                    tracing::warn!(source = adapter.name(), error = %e, "source unavailable");
                    failures.push(e.to_string());
                    let reason = match e {
                        SentimentError::SourceUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    diagnostics.push(Diagnostic::SourceUnavailable {
                        source_name: adapter.name().to_string(),
                        reason,
                    });
                }
            }
        }

        if failures.len() == self.adapters.len() {
            return Err(SentimentError::AllSourcesFailed { failures });
        }

        let normalized = normalize_batch(raw);
        for (source, e) in normalized.failures {
            diagnostics.push(Diagnostic::Normalization {
                source,
                reason: e.to_string(),
            });
        }

        let scored = score_items_until(
            self.classifier.as_ref(),
            normalized.items,
            self.settings.classifier_timeout,
            deadline,
            self.settings.scoring_concurrency,
        )
        .await;
        for (item_id, e) in scored.failures {
            diagnostics.push(Diagnostic::Classifier {
                item_id,
                reason: e.to_string(),
            });
        }

        let report = aggregate(query, scored.items);

        let insight = match &self.insight {
            Some(generator) => {
                let request = generate_insight(generator.as_ref(), &report);
                let result = tokio::time::timeout_at(deadline, request)
                    .await
                    .unwrap_or_else(|_| {
                        Err(SentimentError::Generation(
                            "deadline reached before the insight was ready".to_string(),
                        ))
                    });
                match result {
                    Ok(text) => Some(text),
                    Err(e) => {
                        tracing::warn!(error = %e, "insight generation failed");
                        diagnostics.push(Diagnostic::Generation {
                            reason: e.to_string(),
                        });
                        None
                    }
                }
            }
            None => None,
        };

        tracing::info!(
            query,
            items = report.items.len(),
            duplicates = normalized.duplicates,
            coverage = %diagnostics.coverage(),
            "report built"
        );

        Ok(ReportOutcome {
            report,
            insight,
            diagnostics,
        })
    }
}
