//! Model technique: hosted text-classification endpoint.
//!
//! Posts `{"inputs": text}` to a Hugging Face style inference endpoint and
//! keeps the top label. The scalar is the raw confidence of that label,
//! unsigned: consult `ScoringResult::label` when direction matters.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ScoreError, SentimentScorer};
use crate::data::http::{build_client, DEFAULT_TIMEOUT};
use crate::domain::{ScoringResult, SentimentLabel, Technique};

/// Default hosted model: the stock binary sentiment classifier.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/distilbert-base-uncased-finetuned-sst-2-english";

/// Where and how to reach the hosted model.
#[derive(Debug, Clone)]
pub struct HostedModelConfig {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
}

impl HostedModelConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Endpoints return either one list per input or a flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

fn parse_label(label: &str) -> Option<SentimentLabel> {
    match label.to_ascii_uppercase().as_str() {
        "POSITIVE" | "POS" | "LABEL_1" => Some(SentimentLabel::Positive),
        "NEGATIVE" | "NEG" | "LABEL_0" => Some(SentimentLabel::Negative),
        _ => None,
    }
}

/// Extract the top (label, confidence) pair from a classification response body.
pub fn parse_classification(body: &str) -> Result<(SentimentLabel, f64), String> {
    let response: ClassificationResponse =
        serde_json::from_str(body).map_err(|e| format!("unexpected response: {e}"))?;

    let candidates = match response {
        ClassificationResponse::Nested(mut outer) => {
            if outer.is_empty() {
                Vec::new()
            } else {
                outer.swap_remove(0)
            }
        }
        ClassificationResponse::Flat(flat) => flat,
    };

    let top = candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| "empty classification".to_string())?;

    let label = parse_label(&top.label).ok_or_else(|| format!("unknown label '{}'", top.label))?;
    if !(0.0..=1.0).contains(&top.score) {
        return Err(format!("confidence {} outside [0, 1]", top.score));
    }
    Ok((label, top.score))
}

/// Scorer backed by a hosted classification model.
pub struct HostedModelScorer {
    client: Client,
    config: HostedModelConfig,
}

impl HostedModelScorer {
    pub fn new(config: HostedModelConfig) -> Result<Self, ScoreError> {
        let client = build_client(config.timeout).map_err(|e| ScoreError::ScoringFailed {
            technique: Technique::Model,
            reason: e.to_string(),
        })?;
        Ok(Self { client, config })
    }

    fn failed(reason: impl Into<String>) -> ScoreError {
        ScoreError::ScoringFailed {
            technique: Technique::Model,
            reason: reason.into(),
        }
    }
}

impl SentimentScorer for HostedModelScorer {
    fn technique(&self) -> Technique {
        Technique::Model
    }

    fn score(&self, text: &str) -> Result<ScoringResult, ScoreError> {
        debug!(chars = text.len(), "scoring with hosted model");

        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Self::failed(format!(
                        "timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    Self::failed(e.to_string())
                }
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| Self::failed(e.to_string()))?;
        if !status.is_success() {
            return Err(Self::failed(format!("HTTP {status}: {body}")));
        }

        let (label, confidence) = parse_classification(&body).map_err(Self::failed)?;
        Ok(ScoringResult::model(label, confidence))
    }
}
