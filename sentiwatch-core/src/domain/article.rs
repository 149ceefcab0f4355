//! News articles and their scored form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::score::ScoringResult;

/// A well-formed news article.
///
/// `published_at` is UTC with the offset dropped, so it compares directly
/// against bar timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub published_at: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub source_name: String,
    pub url: String,
}

/// An article with the result of one sentiment technique applied to its title.
///
/// `score` is `None` when that technique failed for this article; the
/// article still takes part in alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: NewsArticle,
    pub score: Option<ScoringResult>,
}

impl ScoredArticle {
    pub fn sentiment(&self) -> Option<f64> {
        self.score.as_ref().map(|s| s.scalar)
    }
}
