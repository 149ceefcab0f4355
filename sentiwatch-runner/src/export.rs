//! Reporting and export: JSON, CSV, and Markdown artifacts of a run.
//!
//! - **JSON**: the full `PipelineOutput` with its `schema_version`
//! - **CSV**: one aligned table per technique, for external analysis tools
//! - **Markdown**: a human-readable run report

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sentiwatch_core::domain::{AlignedRecord, ScoringResult};

use crate::pipeline::PipelineOutput;

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `PipelineOutput` to pretty JSON.
pub fn export_json(output: &PipelineOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize PipelineOutput to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export aligned records as CSV, one row per bar.
///
/// Columns: timestamp, open, high, low, close, volume, moving_average,
/// bollinger_upper, bollinger_lower, price_change, published_at, title,
/// source_name, url, score, label. Article columns are empty on bars
/// without an article; undefined numbers are empty.
pub fn export_aligned_csv(records: &[AlignedRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "moving_average",
        "bollinger_upper",
        "bollinger_lower",
        "price_change",
        "published_at",
        "title",
        "source_name",
        "url",
        "score",
        "label",
    ])?;

    for r in records {
        let article = r.article.as_ref();
        let score = article.and_then(|a| a.score.as_ref());
        wtr.write_record([
            r.bar.timestamp.to_string(),
            format!("{:.4}", r.bar.open),
            format!("{:.4}", r.bar.high),
            format!("{:.4}", r.bar.low),
            format!("{:.4}", r.bar.close),
            r.bar.volume.map(|v| format!("{v:.0}")).unwrap_or_default(),
            opt(r.moving_average),
            opt(r.bollinger_upper),
            opt(r.bollinger_lower),
            opt(r.price_change),
            article
                .map(|a| a.article.published_at.to_string())
                .unwrap_or_default(),
            article.map(|a| a.article.title.clone()).unwrap_or_default(),
            article
                .map(|a| a.article.source_name.clone())
                .unwrap_or_default(),
            article.map(|a| a.article.url.clone()).unwrap_or_default(),
            opt(score.map(|s| s.scalar)),
            score
                .and_then(ScoringResult::label)
                .map(|l| format!("{l:?}").to_ascii_uppercase())
                .unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one run.
pub fn generate_report(output: &PipelineOutput) -> String {
    let s = &output.summary;
    let mut md = String::with_capacity(2048);
    md.push_str(&format!("# Sentiment Report: {}\n\n", s.symbol));

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Series | {} |\n", output.config.series));
    md.push_str(&format!("| Bars | {} |\n", s.bar_count));
    if let (Some(first), Some(last)) = (s.first_timestamp, s.last_timestamp) {
        md.push_str(&format!("| Period | {first} to {last} |\n"));
    }
    md.push_str(&format!("| Moving Average Window | {} |\n", output.config.ma_window));
    md.push_str(&format!(
        "| Last Close | {} |\n",
        s.last_close.map(|c| format!("{c:.2}")).unwrap_or_else(|| "-".into())
    ));
    md.push_str(&format!(
        "| Last Moving Average | {} |\n",
        s.last_moving_average
            .map(|m| format!("{m:.2}"))
            .unwrap_or_else(|| "-".into())
    ));
    md.push_str(&format!(
        "| Articles | {} ({} skipped) |\n",
        s.article_count, s.skipped_articles
    ));
    md.push_str(&format!("| Digest | `{}` |\n", s.digest));
    md.push('\n');

    md.push_str("## Techniques\n\n");
    if s.techniques.is_empty() {
        md.push_str("No sentiment technique was available.\n\n");
    } else {
        md.push_str("| Technique | Attached Bars | Scored Articles | Mean Score | Correlation |\n");
        md.push_str("| --- | --- | --- | --- | --- |\n");
        for (technique, t) in &s.techniques {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                technique,
                t.attached_records,
                t.scored_articles,
                t.mean_score.map(|m| format!("{m:.3}")).unwrap_or_else(|| "-".into()),
                t.correlation.map(|c| format!("{c:.3}")).unwrap_or_else(|| "-".into()),
            ));
        }
        md.push('\n');
    }

    if !output.articles.is_empty() {
        md.push_str("## Articles\n\n");
        for report in &output.articles {
            let a = &report.article;
            md.push_str(&format!(
                "- **{}** ({}, {})\n",
                a.title, a.source_name, a.published_at
            ));
            for (technique, score) in &report.description_scores {
                let (pos, neg) = score.polarity_split();
                md.push_str(&format!(
                    "  - {technique}: {:.3} (positive {:.0}%, negative {:.0}%)\n",
                    score.scalar,
                    pos * 100.0,
                    neg * 100.0
                ));
            }
        }
        md.push('\n');
    }

    if !output.issues.is_empty() {
        md.push_str("## Issues\n\n");
        for issue in &output.issues {
            md.push_str(&format!("- {issue}\n"));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates a directory named `{symbol}_{timestamp}/` under `output_dir`
/// containing:
/// - `run.json`: the full `PipelineOutput`
/// - `aligned_<technique>.csv`: one aligned table per available technique
/// - `report.md`: the Markdown report
///
/// Returns the path to the created directory.
pub fn save_artifacts(output: &PipelineOutput, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        output.summary.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("run.json"), export_json(output)?)
        .context("failed to write run.json")?;

    for (technique, records) in &output.aligned {
        let name = format!("aligned_{technique}.csv");
        std::fs::write(run_dir.join(&name), export_aligned_csv(records)?)
            .with_context(|| format!("failed to write {name}"))?;
    }

    std::fs::write(run_dir.join("report.md"), generate_report(output))
        .context("failed to write report.md")?;

    Ok(run_dir)
}
