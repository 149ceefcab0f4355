//! Run summary: scalar figures for presentation plus a determinism digest.
//!
//! All figures are pure functions of the run's series and aligned output.
//! Correlation is a plain Pearson coefficient over (score, price change)
//! pairs; no claim is made about its statistical soundness.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use sentiwatch_core::domain::{AlignedRecord, PriceSeries, ScoredArticle, Technique};
use sentiwatch_core::indicators::MOVING_AVERAGE;
use sentiwatch_core::stats::{mean, pearson};

/// Per-technique figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueSummary {
    /// Aligned records that carry an article.
    pub attached_records: usize,
    /// Articles that received a score.
    pub scored_articles: usize,
    /// Mean scalar over scored articles.
    pub mean_score: Option<f64>,
    /// Pearson correlation of the attached score against `price_change`.
    pub correlation: Option<f64>,
}

impl TechniqueSummary {
    pub fn compute(records: &[AlignedRecord], scored: &[ScoredArticle]) -> Self {
        let scores: Vec<f64> = scored.iter().filter_map(ScoredArticle::sentiment).collect();
        let points: Vec<(f64, f64)> = records
            .iter()
            .filter_map(AlignedRecord::correlation_point)
            .collect();

        Self {
            attached_records: records.iter().filter(|r| r.has_article()).count(),
            scored_articles: scores.len(),
            mean_score: mean(&scores),
            correlation: pearson(&points),
        }
    }
}

/// Scalar figures describing one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub symbol: String,
    pub bar_count: usize,
    /// Well-formed articles that took part in the run.
    pub article_count: usize,
    /// Articles dropped as malformed.
    pub skipped_articles: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub last_close: Option<f64>,
    pub last_moving_average: Option<f64>,
    pub techniques: BTreeMap<Technique, TechniqueSummary>,
    /// blake3 hex digest of the aligned output.
    pub digest: String,
}

impl RunSummary {
    pub fn compute(
        series: &PriceSeries,
        aligned: &BTreeMap<Technique, Vec<AlignedRecord>>,
        scored: &BTreeMap<Technique, Vec<ScoredArticle>>,
        article_count: usize,
        skipped_articles: usize,
    ) -> Result<Self, serde_json::Error> {
        let last_index = series.len().checked_sub(1);
        let techniques = aligned
            .iter()
            .map(|(technique, records)| {
                let articles = scored.get(technique).map(Vec::as_slice).unwrap_or(&[]);
                (*technique, TechniqueSummary::compute(records, articles))
            })
            .collect();

        Ok(Self {
            symbol: series.symbol.clone(),
            bar_count: series.len(),
            article_count,
            skipped_articles,
            first_timestamp: series.bars.first().map(|b| b.timestamp),
            last_timestamp: series.bars.last().map(|b| b.timestamp),
            last_close: series.bars.last().map(|b| b.close),
            last_moving_average: last_index.and_then(|i| series.column_value(MOVING_AVERAGE, i)),
            techniques,
            digest: digest(aligned)?,
        })
    }
}

/// Content digest of an aligned output.
///
/// Two runs over identical inputs with deterministic techniques produce the
/// same digest.
pub fn digest(aligned: &BTreeMap<Technique, Vec<AlignedRecord>>) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(aligned)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
