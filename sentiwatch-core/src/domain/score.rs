//! Sentiment techniques and their scoring output contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two coexisting sentiment techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Lexicon/rule-based scorer; compound score in [-1, 1].
    Lexicon,
    /// Learned-model classifier; label plus confidence in [0, 1].
    Model,
}

impl Technique {
    pub const ALL: [Technique; 2] = [Technique::Lexicon, Technique::Model];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Lexicon => "lexicon",
            Technique::Model => "model",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lexicon" => Ok(Technique::Lexicon),
            "model" => Ok(Technique::Model),
            _ => Err(format!("unknown technique '{s}'")),
        }
    }
}

/// Predicted class of the model-based technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

/// Technique-specific detail behind a scalar score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "technique", rename_all = "snake_case")]
pub enum ScoreDetail {
    Lexicon {
        negative: f64,
        neutral: f64,
        positive: f64,
        compound: f64,
    },
    Model {
        label: SentimentLabel,
        confidence: f64,
    },
}

/// Output of one technique applied to one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Lexicon: compound in [-1, 1]. Model: raw confidence in [0, 1] for
    /// whichever label was predicted (not sign-corrected).
    pub scalar: f64,
    pub detail: ScoreDetail,
}

impl ScoringResult {
    pub fn lexicon(negative: f64, neutral: f64, positive: f64, compound: f64) -> Self {
        Self {
            scalar: compound,
            detail: ScoreDetail::Lexicon {
                negative,
                neutral,
                positive,
                compound,
            },
        }
    }

    pub fn model(label: SentimentLabel, confidence: f64) -> Self {
        Self {
            scalar: confidence,
            detail: ScoreDetail::Model { label, confidence },
        }
    }

    pub fn label(&self) -> Option<SentimentLabel> {
        match self.detail {
            ScoreDetail::Model { label, .. } => Some(label),
            ScoreDetail::Lexicon { .. } => None,
        }
    }

    /// Scalar with the model label applied as a sign.
    ///
    /// The pipeline correlates on the raw `scalar`; this is for consumers
    /// that need direction.
    pub fn signed_scalar(&self) -> f64 {
        match self.detail {
            ScoreDetail::Model {
                label: SentimentLabel::Negative,
                confidence,
            } => -confidence,
            _ => self.scalar,
        }
    }

    /// Positive/negative shares for a two-slice breakdown.
    ///
    /// For the model technique the predicted label takes the confidence and
    /// the other label takes the complement.
    pub fn polarity_split(&self) -> (f64, f64) {
        match self.detail {
            ScoreDetail::Lexicon {
                positive, negative, ..
            } => (positive, negative),
            ScoreDetail::Model {
                label: SentimentLabel::Positive,
                confidence,
            } => (confidence, 1.0 - confidence),
            ScoreDetail::Model {
                label: SentimentLabel::Negative,
                confidence,
            } => (1.0 - confidence, confidence),
        }
    }
}
