//! Data source traits and structured error types.
//!
//! The price and news sources are opaque collaborators returning raw JSON.
//! Traits let the pipeline run against live HTTP clients, saved payloads,
//! or test doubles without knowing which.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::SeriesKind;

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and log contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data: '{series_key}' missing from response{}", detail_suffix(.detail))]
    NoData {
        series_key: String,
        detail: Option<String>,
    },

    #[error("request to {provider} timed out after {timeout_secs}s")]
    Timeout {
        provider: String,
        timeout_secs: u64,
    },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("HTTP {status} from {provider}{}", detail_suffix(.message))]
    Http {
        provider: String,
        status: u16,
        message: Option<String>,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("malformed record '{key}': {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("replay payload unavailable: {0}")]
    Replay(String),

    #[error("data error: {0}")]
    Other(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl DataError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DataError::Timeout { .. })
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, DataError::NoData { .. })
    }
}

/// What to ask the price source for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub symbol: String,
    pub series: SeriesKind,
}

/// What to ask the news source for.
///
/// Language and ordering are fixed: English, by relevancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRequest {
    pub query: String,
    pub page_size: usize,
}

impl NewsRequest {
    pub const LANGUAGE: &'static str = "en";
    pub const SORT_BY: &'static str = "relevancy";
}

/// Source of raw OHLCV payloads.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the raw nested payload for a symbol and series kind.
    fn fetch_prices(&self, request: &PriceRequest) -> Result<Value, DataError>;
}

/// Source of raw news payloads.
pub trait NewsSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the raw article listing for a query.
    fn fetch_news(&self, request: &NewsRequest) -> Result<Value, DataError>;
}
