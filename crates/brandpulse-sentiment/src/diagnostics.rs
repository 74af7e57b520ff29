//! Recovered failures collected alongside a report.

use serde::Serialize;

use crate::types::Source;

/// One failure the pipeline recovered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A source adapter failed or did not answer before the deadline.
    SourceUnavailable { source_name: String, reason: String },
    /// A raw item could not be normalized and was dropped.
    Normalization { source: Source, reason: String },
    /// The classifier failed for one item; the item was scored Neutral/0.0.
    Classifier { item_id: String, reason: String },
    /// The narrative could not be generated.
    Generation { reason: String },
}

/// Diagnostics for one `build_report` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub sources_attempted: usize,
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(sources_attempted: usize) -> Self {
        Self {
            sources_attempted,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the sources that failed, in registration order.
    #[must_use]
    pub fn failed_sources(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|d| match d {
                Diagnostic::SourceUnavailable { source_name, .. } => Some(source_name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn sources_succeeded(&self) -> usize {
        self.sources_attempted
            .saturating_sub(self.failed_sources().len())
    }

    #[must_use]
    pub fn classifier_error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::Classifier { .. }))
            .count()
    }

    #[must_use]
    pub fn normalization_error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::Normalization { .. }))
            .count()
    }

    #[must_use]
    pub fn generation_failed(&self) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d, Diagnostic::Generation { .. }))
    }

    /// Human-readable coverage line, e.g. `2 of 3 sources returned results`.
    #[must_use]
    pub fn coverage(&self) -> String {
        format!(
            "{} of {} sources returned results",
            self.sources_succeeded(),
            self.sources_attempted
        )
    }
}
