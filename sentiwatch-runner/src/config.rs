//! Run configuration, settings file, and credential resolution.
//!
//! `RunConfig` describes one pipeline run and is validated before any
//! network call. `Settings` is the optional TOML file holding API keys,
//! the HTTP timeout, and the hosted model endpoint. Keys missing from the
//! file fall back to environment variables of the same name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sentiwatch_core::domain::SeriesKind;
use sentiwatch_core::indicators::{MAX_WINDOW, MIN_WINDOW};
use sentiwatch_core::sentiment::HostedModelConfig;

/// Price source API key name, in the settings file and the environment.
pub const PRICE_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";
/// News source API key name, in the settings file and the environment.
pub const NEWS_KEY_VAR: &str = "NEWSAPI_API_KEY";
/// Hosted model token, read from the environment when `[model] token` is unset.
pub const MODEL_TOKEN_VAR: &str = "HF_API_TOKEN";

pub const MIN_ARTICLES: usize = 1;
pub const MAX_ARTICLES: usize = 100;

const DEFAULT_MA_WINDOW: usize = 20;
const DEFAULT_ARTICLE_COUNT: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration and credential errors. Always raised before any network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing credential '{name}' (set it under [api_keys] or in the environment)")]
    MissingCredential { name: String },

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("moving average window {0} outside [1, 100]")]
    WindowOutOfRange(usize),

    #[error("article count {0} outside [1, 100]")]
    ArticleCountOutOfRange(usize),

    #[error("invalid series: {0}")]
    InvalidSeries(String),

    #[error("timeout must be at least one second")]
    ZeroTimeout,

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: display,
        reason: e.to_string(),
    })
}

// ─── Run configuration ──────────────────────────────────────────────

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ticker; also the news query.
    pub symbol: String,

    #[serde(default = "default_series")]
    pub series: SeriesKind,

    /// Moving average (and Bollinger) window, in bars.
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,

    #[serde(default)]
    pub show_bollinger: bool,

    /// Number of news articles to request.
    #[serde(default = "default_article_count")]
    pub article_count: usize,
}

fn default_series() -> SeriesKind {
    SeriesKind::Daily
}

fn default_ma_window() -> usize {
    DEFAULT_MA_WINDOW
}

fn default_article_count() -> usize {
    DEFAULT_ARTICLE_COUNT
}

impl RunConfig {
    /// A config for `series` with the default window, no bands, and the default article count.
    pub fn new(symbol: impl Into<String>, series: SeriesKind) -> Self {
        Self {
            symbol: symbol.into(),
            series,
            ma_window: DEFAULT_MA_WINDOW,
            show_bollinger: false,
            article_count: DEFAULT_ARTICLE_COUNT,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Check ranges without modifying the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&self.ma_window) {
            return Err(ConfigError::WindowOutOfRange(self.ma_window));
        }
        if !(MIN_ARTICLES..=MAX_ARTICLES).contains(&self.article_count) {
            return Err(ConfigError::ArticleCountOutOfRange(self.article_count));
        }
        Ok(())
    }

    /// Validate, then normalize the symbol (trimmed, upper-case).
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.validate()?;
        self.symbol = self.symbol.trim().to_ascii_uppercase();
        Ok(self)
    }
}

// ─── Settings file ──────────────────────────────────────────────────

/// Optional settings file contents.
///
/// ```toml
/// [api_keys]
/// ALPHA_VANTAGE_API_KEY = "..."
/// NEWSAPI_API_KEY = "..."
///
/// [http]
/// timeout_secs = 30
///
/// [model]
/// endpoint = "https://..."
/// token = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub model: ModelSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelSettings {
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        read_toml(path)
    }

    /// Network timeout for every outbound request.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Duration::from_secs(self.http.timeout_secs))
    }

    /// Hosted model configuration, when a token is set under `[model]` or in `env`.
    pub fn model_config<F>(&self, env: F) -> Result<Option<HostedModelConfig>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = self
            .model
            .token
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env(MODEL_TOKEN_VAR).filter(|v| !v.trim().is_empty()));
        let Some(token) = token else {
            return Ok(None);
        };

        let mut config = HostedModelConfig::new(token);
        if let Some(endpoint) = &self.model.endpoint {
            config.endpoint = endpoint.clone();
        }
        config.timeout = self.timeout()?;
        Ok(Some(config))
    }
}

// ─── Credentials ────────────────────────────────────────────────────

/// Resolved data source API keys.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub price_api_key: String,
    pub news_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("price_api_key", &"<redacted>")
            .field("news_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve keys from `settings` first, then from `env`.
    ///
    /// Blank values count as missing.
    pub fn resolve<F>(settings: &Settings, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| -> Option<String> {
            settings
                .api_keys
                .get(name)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| env(name).filter(|v| !v.trim().is_empty()))
        };
        let required = |name: &str| {
            lookup(name).ok_or_else(|| ConfigError::MissingCredential {
                name: name.to_string(),
            })
        };

        Ok(Self {
            price_api_key: required(PRICE_KEY_VAR)?,
            news_api_key: required(NEWS_KEY_VAR)?,
        })
    }

    /// Resolve against the process environment.
    pub fn from_env(settings: &Settings) -> Result<Self, ConfigError> {
        Self::resolve(settings, |name| std::env::var(name).ok())
    }
}
