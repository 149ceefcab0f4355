//! NewsAPI news source (`/v2/everything`).

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::info;

use super::http::{build_client, get_json, request_url, DEFAULT_TIMEOUT};
use super::provider::{DataError, NewsRequest, NewsSource};

const BASE_URL: &str = "https://newsapi.org/v2/everything";

/// NewsAPI caps `pageSize` at 100.
const MAX_PAGE_SIZE: usize = 100;

/// NewsAPI news source.
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            timeout,
        })
    }

    pub fn with_default_timeout(api_key: impl Into<String>) -> Result<Self, DataError> {
        Self::new(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query_params(&self, request: &NewsRequest, page_size: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", request.query.clone()),
            ("language", NewsRequest::LANGUAGE.to_string()),
            ("sortBy", NewsRequest::SORT_BY.to_string()),
            ("pageSize", page_size.to_string()),
            ("apiKey", self.api_key.clone()),
        ]
    }
}

impl NewsSource for NewsApiClient {
    fn name(&self) -> &str {
        "newsapi"
    }

    fn fetch_news(&self, request: &NewsRequest) -> Result<Value, DataError> {
        info!(query = %request.query, page_size = request.page_size, "fetching news");
        let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let params = self.query_params(request, &page_size);
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let url = request_url(&self.base_url, &borrowed)?;
        get_json(&self.client, self.name(), self.timeout, url)
    }
}
