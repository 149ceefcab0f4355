//! AlignedRecord: one price bar joined with its as-of article.

use serde::Serialize;

use super::article::ScoredArticle;
use super::bar::PriceBar;

/// One bar joined with the most recent article published at or before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRecord {
    pub bar: PriceBar,
    pub moving_average: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    /// `None` when no article precedes the bar.
    pub article: Option<ScoredArticle>,
    /// Fractional change of close vs. the previous bar; `None` for the first bar.
    pub price_change: Option<f64>,
}

impl AlignedRecord {
    pub fn has_article(&self) -> bool {
        self.article.is_some()
    }

    pub fn sentiment(&self) -> Option<f64> {
        self.article.as_ref().and_then(ScoredArticle::sentiment)
    }

    /// The (sentiment, price change) point for a correlation scatter, if both exist.
    pub fn correlation_point(&self) -> Option<(f64, f64)> {
        Some((self.sentiment()?, self.price_change?))
    }
}
