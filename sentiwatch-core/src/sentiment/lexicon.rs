//! Lexicon technique: VADER polarity scores.
//!
//! Returns the compound score in [-1, 1] as the scalar, with the
//! negative/neutral/positive/compound breakdown as detail.

use vader_sentiment::SentimentIntensityAnalyzer;

use super::{ScoreError, SentimentScorer};
use crate::domain::{ScoringResult, Technique};

/// VADER scorer. The lexicon is loaded once, when constructed.
pub struct LexiconScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn technique(&self) -> Technique {
        Technique::Lexicon
    }

    fn score(&self, text: &str) -> Result<ScoringResult, ScoreError> {
        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);

        let compound = get("compound");
        if !compound.is_finite() {
            return Err(ScoreError::ScoringFailed {
                technique: Technique::Lexicon,
                reason: format!("non-finite compound score for '{text}'"),
            });
        }

        Ok(ScoringResult::lexicon(
            get("neg"),
            get("neu"),
            get("pos"),
            compound.clamp(-1.0, 1.0),
        ))
    }
}
