//! Shared blocking HTTP plumbing for the JSON data sources.
//!
//! One request per call: no retries. A timeout on the client is surfaced as
//! `DataError::Timeout` so the caller can show it on the fetch step.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use super::provider::DataError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("sentiwatch/", env!("CARGO_PKG_VERSION"));

/// Build a blocking client with the given timeout.
pub fn build_client(timeout: Duration) -> Result<Client, DataError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))
}

/// Build a request URL from a base and query parameters.
pub fn request_url(base: &str, params: &[(&str, &str)]) -> Result<Url, DataError> {
    Url::parse_with_params(base, params)
        .map_err(|e| DataError::Other(format!("invalid request URL '{base}': {e}")))
}

/// Map a transport-level error onto the data error kinds.
pub fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> DataError {
    if err.is_timeout() {
        DataError::Timeout {
            provider: provider.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else if err.is_connect() {
        DataError::NetworkUnreachable(err.to_string())
    } else {
        DataError::Other(format!("{provider} request failed: {err}"))
    }
}

/// Map a non-success status onto the data error kinds.
///
/// `body` is the (possibly empty) response body; a JSON `message` field is
/// lifted into the error when present.
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> DataError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return DataError::RateLimited {
            provider: provider.to_string(),
        };
    }
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
    DataError::Http {
        provider: provider.to_string(),
        status: status.as_u16(),
        message,
    }
}

/// Execute a GET and decode the body as JSON.
pub fn get_json(
    client: &Client,
    provider: &str,
    timeout: Duration,
    url: Url,
) -> Result<Value, DataError> {
    debug!(provider, host = url.host_str().unwrap_or_default(), "GET");

    let resp = client
        .get(url)
        .send()
        .map_err(|e| transport_error(provider, timeout, e))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(status_error(provider, status, &body));
    }

    resp.json::<Value>().map_err(|e| {
        if e.is_timeout() {
            transport_error(provider, timeout, e)
        } else {
            DataError::ResponseFormatChanged(format!("{provider} returned non-JSON body: {e}"))
        }
    })
}
