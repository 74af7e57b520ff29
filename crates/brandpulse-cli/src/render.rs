//! Plain-text rendering of a report outcome.

use std::fmt;

use brandpulse_sentiment::{
    ContentItem, DateWindow, Diagnostic, ReportOutcome, SentimentLabel, Source,
};

/// Longest title shown in the top-items list before it is cut.
const MAX_TITLE_CHARS: usize = 100;

/// Cut `title` to [`MAX_TITLE_CHARS`] characters, appending `...` when cut.
pub(crate) fn truncate_title(title: &str) -> String {
    match title.char_indices().nth(MAX_TITLE_CHARS) {
        Some((idx, _)) => format!("{}...", &title[..idx]),
        None => title.to_string(),
    }
}

/// Plain-text view of a finished report.
struct TextReport<'a> {
    outcome: &'a ReportOutcome,
    window: Option<&'a DateWindow>,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = &self.outcome.report;

        writeln!(f, "# Brand report: {}", report.query)?;
        writeln!(
            f,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        if let Some(window) = self.window {
            writeln!(f, "Window: {} to {}", window.from, window.to)?;
        }
        writeln!(f)?;

        writeln!(f, "## Metrics")?;
        writeln!(
            f,
            "{:<14}{:>7}{:>9}{:>6}{:>6}{:>6}",
            "SOURCE", "ITEMS", "AVG", "POS", "NEG", "NEU"
        )?;
        for source in Source::ALL {
            let summary = report.summary(source);
            writeln!(
                f,
                "{:<14}{:>7}{:>9.2}{:>6}{:>6}{:>6}",
                source.as_str(),
                summary.count,
                summary.average_score,
                summary.positive,
                summary.negative,
                summary.neutral
            )?;
        }
        writeln!(
            f,
            "Total: {} items (Positive {}, Negative {}, Neutral {})",
            report.items.len(),
            report.label_count(SentimentLabel::Positive),
            report.label_count(SentimentLabel::Negative),
            report.label_count(SentimentLabel::Neutral)
        )?;
        writeln!(f)?;

        writeln!(f, "## Trend")?;
        if report.trend.is_empty() {
            writeln!(f, "no dated items")?;
        } else {
            writeln!(f, "{:<12}{:<14}{:>8}{:>7}", "DATE", "SOURCE", "AVG", "ITEMS")?;
            for point in &report.trend {
                writeln!(
                    f,
                    "{:<12}{:<14}{:>8.2}{:>7}",
                    point.date.to_string(),
                    point.source.as_str(),
                    point.average_score,
                    point.count
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "## Top items")?;
        if report.top_items.is_empty() {
            writeln!(f, "no items")?;
        }
        for (source, items) in &report.top_items {
            writeln!(f, "### {source}")?;
            for item in items {
                write_item(f, item)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "## Top terms")?;
        if report.top_terms.is_empty() {
            writeln!(f, "none")?;
        } else {
            let terms: Vec<String> = report
                .top_terms
                .iter()
                .map(|t| format!("{} ({})", t.term, t.count))
                .collect();
            writeln!(f, "{}", terms.join(", "))?;
        }
        writeln!(f)?;

        writeln!(f, "## Insight")?;
        match &self.outcome.insight {
            Some(text) => writeln!(f, "{text}")?,
            None => writeln!(f, "insight unavailable")?,
        }
        writeln!(f)?;

        writeln!(f, "## Coverage")?;
        writeln!(f, "{}", self.outcome.diagnostics.coverage())?;
        for diagnostic in &self.outcome.diagnostics.entries {
            writeln!(f, "- {}", describe(diagnostic))?;
        }
        Ok(())
    }
}

pub(crate) fn render_text(outcome: &ReportOutcome, window: Option<&DateWindow>) -> String {
    TextReport { outcome, window }.to_string()
}

fn write_item(f: &mut fmt::Formatter<'_>, item: &ContentItem) -> fmt::Result {
    let mut meta: Vec<String> = Vec::new();
    if let Some(outlet) = &item.outlet {
        meta.push(outlet.clone());
    }
    if let Some(published_at) = item.published_at {
        meta.push(published_at.format("%Y-%m-%d").to_string());
    }
    let title = if item.title.is_empty() {
        "(untitled)".to_string()
    } else {
        truncate_title(&item.title)
    };

    write!(f, "- [{:+.2} {}] {}", item.score(), item.label(), title)?;
    if !meta.is_empty() {
        write!(f, " ({})", meta.join(", "))?;
    }
    writeln!(f)?;
    if let Some(url) = &item.url {
        writeln!(f, "  {url}")?;
    }
    Ok(())
}

fn describe(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::SourceUnavailable {
            source_name,
            reason,
        } => format!("source {source_name} unavailable: {reason}"),
        Diagnostic::Normalization { source, reason } => {
            format!("dropped {source} item: {reason}")
        }
        Diagnostic::Classifier { item_id, reason } => {
            format!("scored {item_id} neutral: {reason}")
        }
        Diagnostic::Generation { reason } => format!("insight failed: {reason}"),
    }
}
