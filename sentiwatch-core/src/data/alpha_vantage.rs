//! Alpha Vantage price source.
//!
//! Fetches raw `TIME_SERIES_*` payloads. The payload is returned as-is; the
//! Series Normalizer decides whether it contains data. Alpha Vantage reports
//! invalid symbols and rate limits with HTTP 200 and a note in the body, so
//! a successful fetch does not imply data is present.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::info;

use super::http::{build_client, get_json, request_url, DEFAULT_TIMEOUT};
use super::provider::{DataError, PriceRequest, PriceSource};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage price source.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AlphaVantageClient {
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

    /// Point the client at a different endpoint (e.g., a local mirror).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Query parameters for a request, API key last.
    fn query_params<'a>(&'a self, request: &'a PriceRequest) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("function", request.series.function()),
            ("symbol", request.symbol.as_str()),
        ];
        if let Some(interval) = request.series.interval() {
            params.push(("interval", interval.as_str()));
        }
        params.push(("apikey", self.api_key.as_str()));
        params
    }
}

impl PriceSource for AlphaVantageClient {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_prices(&self, request: &PriceRequest) -> Result<Value, DataError> {
        info!(symbol = %request.symbol, series = %request.series, "fetching price series");
        let url = request_url(&self.base_url, &self.query_params(request))?;
        get_json(&self.client, self.name(), self.timeout, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntradayInterval, SeriesKind};

    #[test]
    fn intraday_params_include_interval() {
        let client = AlphaVantageClient::with_default_timeout("demo").unwrap();
        let request = PriceRequest {
            symbol: "IBM".into(),
            series: SeriesKind::Intraday(IntradayInterval::FiveMinutes),
        };
        let params = client.query_params(&request);
        assert_eq!(
            params,
            vec![
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", "IBM"),
                ("interval", "5min"),
                ("apikey", "demo"),
            ]
        );
    }

    #[test]
    fn daily_params_omit_interval() {
        let client = AlphaVantageClient::with_default_timeout("demo").unwrap();
        let request = PriceRequest {
            symbol: "IBM".into(),
            series: SeriesKind::Daily,
        };
        let params = client.query_params(&request);
        assert!(params.iter().all(|(k, _)| *k != "interval"));
        assert_eq!(params[0], ("function", "TIME_SERIES_DAILY"));
    }
}
