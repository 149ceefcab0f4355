//! News normalization: raw article listing to validated `NewsArticle`s.
//!
//! Each article is validated on its own: a record missing a required field
//! becomes a `NewsError::MalformedArticle` for that article only.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;

use super::provider::DataError;
use crate::domain::NewsArticle;

/// Per-article errors. Never fatal to a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NewsError {
    #[error("article #{index} is malformed: {reason}")]
    MalformedArticle { index: usize, reason: String },
}

impl NewsError {
    fn missing(index: usize, field: &str) -> Self {
        NewsError::MalformedArticle {
            index,
            reason: format!("missing '{field}'"),
        }
    }
}

/// Parse a NewsAPI-style listing into per-article results, in payload order.
///
/// A payload with `"status": "error"` fails as a whole. A payload without an
/// `articles` array is an empty listing.
pub fn parse_articles(payload: &Value) -> Result<Vec<Result<NewsArticle, NewsError>>, DataError> {
    if payload.get("status").and_then(Value::as_str) == Some("error") {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("news source reported an error");
        return Err(DataError::ResponseFormatChanged(message.to_string()));
    }

    let articles = match payload.get("articles") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(articles)) => articles,
        Some(_) => {
            return Err(DataError::ResponseFormatChanged(
                "'articles' is not an array".into(),
            ))
        }
    };

    Ok(articles
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_article(index, raw))
        .collect())
}

/// Parse an ISO-8601 `publishedAt` into naive UTC.
///
/// Offsets are converted to UTC and then dropped; a value without an offset
/// is taken as already naive.
pub fn parse_published_at(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn parse_article(index: usize, raw: &Value) -> Result<NewsArticle, NewsError> {
    let text = |field: &str| -> Result<String, NewsError> {
        raw.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NewsError::missing(index, field))
    };

    let published_raw = text("publishedAt")?;
    let published_at =
        parse_published_at(&published_raw).ok_or_else(|| NewsError::MalformedArticle {
            index,
            reason: format!("unparseable publishedAt '{published_raw}'"),
        })?;

    let source_name = raw
        .get("source")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| NewsError::missing(index, "source.name"))?;

    Ok(NewsArticle {
        published_at,
        title: text("title")?,
        description: text("description")?,
        source_name,
        url: text("url")?,
    })
}

/// Stable sort of articles ascending by `published_at`.
pub fn sort_by_published(articles: &mut [NewsArticle]) {
    articles.sort_by_key(|a| a.published_at);
}
