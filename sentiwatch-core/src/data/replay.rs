//! Replay sources: serve previously captured raw payloads from disk.
//!
//! A replay directory holds `price.json` and `news.json`, exactly as the
//! live providers returned them. Used for offline runs and fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use super::provider::{DataError, NewsRequest, NewsSource, PriceRequest, PriceSource};

pub const PRICE_FILE: &str = "price.json";
pub const NEWS_FILE: &str = "news.json";

fn read_payload(path: &Path) -> Result<Value, DataError> {
    let text = fs::read_to_string(path)
        .map_err(|e| DataError::Replay(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| DataError::Replay(format!("{}: invalid JSON: {e}", path.display())))
}

/// Price payloads from `<dir>/price.json`.
#[derive(Debug, Clone)]
pub struct ReplayPriceSource {
    path: PathBuf,
}

impl ReplayPriceSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PRICE_FILE),
        }
    }
}

impl PriceSource for ReplayPriceSource {
    fn name(&self) -> &str {
        "replay"
    }

    fn fetch_prices(&self, request: &PriceRequest) -> Result<Value, DataError> {
        info!(symbol = %request.symbol, path = %self.path.display(), "replaying price payload");
        read_payload(&self.path)
    }
}

/// News payloads from `<dir>/news.json`, truncated to the requested page size.
#[derive(Debug, Clone)]
pub struct ReplayNewsSource {
    path: PathBuf,
}

impl ReplayNewsSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(NEWS_FILE),
        }
    }
}

impl NewsSource for ReplayNewsSource {
    fn name(&self) -> &str {
        "replay"
    }

    fn fetch_news(&self, request: &NewsRequest) -> Result<Value, DataError> {
        info!(query = %request.query, path = %self.path.display(), "replaying news payload");
        let mut payload = read_payload(&self.path)?;
        if let Some(Value::Array(articles)) = payload.get_mut("articles") {
            articles.truncate(request.page_size);
        }
        Ok(payload)
    }
}
