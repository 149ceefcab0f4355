//! Sentiment Scorer Adapter.
//!
//! Each technique is a `SentimentScorer`. The `ScorerRegistry` is built once
//! at startup and passed to the pipeline; a technique whose backing
//! capability is unavailable is simply not registered, and scoring with it
//! yields `ScoreError::TechniqueUnavailable`. Remote techniques must score a
//! sample text once at startup before they are registered.

pub mod lexicon;
pub mod model;

pub use lexicon::LexiconScorer;
pub use model::{HostedModelConfig, HostedModelScorer};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{ScoringResult, Technique};

/// Text scored once at startup to confirm a remote technique answers.
pub const READINESS_TEXT: &str = "The market opened higher today.";

/// Per-technique scoring errors. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("sentiment technique '{0}' is unavailable")]
    TechniqueUnavailable(Technique),

    #[error("{technique} scoring failed: {reason}")]
    ScoringFailed { technique: Technique, reason: String },
}

/// A sentiment technique: text in, bounded score plus detail out.
///
/// Scoring is stateless per call; any backing resources are loaded when the
/// scorer is constructed.
pub trait SentimentScorer: Send + Sync {
    fn technique(&self) -> Technique;

    fn score(&self, text: &str) -> Result<ScoringResult, ScoreError>;
}

/// The set of techniques available to this process.
#[derive(Default)]
pub struct ScorerRegistry {
    scorers: BTreeMap<Technique, Box<dyn SentimentScorer>>,
}

impl ScorerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the lexicon scorer, plus the hosted model when configured
    /// and answering.
    pub fn initialize(model: Option<HostedModelConfig>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LexiconScorer::new()));

        match model {
            Some(config) => match HostedModelScorer::new(config) {
                Ok(scorer) => {
                    registry.register_if_ready(Box::new(scorer));
                }
                Err(e) => warn!(error = %e, "model technique unavailable"),
            },
            None => info!("no model endpoint configured; model technique unavailable"),
        }

        registry
    }

    /// Register a scorer, replacing any existing one for its technique.
    pub fn register(&mut self, scorer: Box<dyn SentimentScorer>) {
        self.scorers.insert(scorer.technique(), scorer);
    }

    /// Register `scorer` only if it scores `READINESS_TEXT` successfully.
    /// Returns whether it was registered.
    pub fn register_if_ready(&mut self, scorer: Box<dyn SentimentScorer>) -> bool {
        let technique = scorer.technique();
        match scorer.score(READINESS_TEXT) {
            Ok(_) => {
                info!(%technique, "technique ready");
                self.register(scorer);
                true
            }
            Err(e) => {
                warn!(%technique, error = %e, "technique failed its startup check; unavailable");
                false
            }
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.register(scorer);
        self
    }

    pub fn is_available(&self, technique: Technique) -> bool {
        self.scorers.contains_key(&technique)
    }

    /// Registered techniques in a fixed order.
    pub fn techniques(&self) -> impl Iterator<Item = Technique> + '_ {
        self.scorers.keys().copied()
    }

    pub fn get(&self, technique: Technique) -> Result<&dyn SentimentScorer, ScoreError> {
        self.scorers
            .get(&technique)
            .map(|s| s.as_ref())
            .ok_or(ScoreError::TechniqueUnavailable(technique))
    }

    /// Score `text` with `technique`.
    pub fn score(&self, text: &str, technique: Technique) -> Result<ScoringResult, ScoreError> {
        self.get(technique)?.score(text)
    }
}
