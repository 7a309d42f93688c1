//! Client and widget configuration

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::calculator::Calculator;
use crate::client::{RetryPolicy, DEFAULT_BASE_URL, DEFAULT_RETRY_DELAYS_MS, DEFAULT_TIMEOUT_MS};
use crate::sync::Language;

/// Environment variable overriding the proxy base URL
pub const ENV_API_BASE: &str = "PTP_API_BASE";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_MS: &str = "PTP_TIMEOUT_MS";

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment override could not be used
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue {
        /// Environment variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },

    /// Widget URL could not be parsed
    #[error("Invalid widget URL: {0}")]
    InvalidUrl(String),

    /// Widget path names no known calculator and role
    #[error("Unknown widget '{0}'")]
    UnknownWidget(String),
}

/// Request client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Proxy base URL, without trailing slash
    pub base_url: String,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay before each retry in milliseconds
    pub retry_delays_ms: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_delays_ms: DEFAULT_RETRY_DELAYS_MS.to_vec(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PTP_API_BASE` and `PTP_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            let base = base.trim().trim_end_matches('/').to_string();
            Url::parse(&base).map_err(|_| ConfigError::InvalidValue {
                name: ENV_API_BASE,
                value: base.clone(),
            })?;
            config.base_url = base;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
            config.timeout_ms = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: ENV_TIMEOUT_MS,
                    value: timeout,
                })?;
        }
        Ok(config)
    }

    /// Retry schedule built from `retry_delays_ms`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_delays_ms(&self.retry_delays_ms)
    }
}

/// Which side of a comparison a widget is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetRole {
    /// Computes the reference setup and publishes its result
    Original,
    /// Computes the modified setup and compares against the baseline
    New,
}

impl WidgetRole {
    /// Role name used in widget URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetRole::Original => "original",
            WidgetRole::New => "new",
        }
    }
}

impl fmt::Display for WidgetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(WidgetRole::Original),
            "new" => Ok(WidgetRole::New),
            other => Err(format!("unknown widget role '{}'", other)),
        }
    }
}

/// Per-widget settings taken from the widget URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Calculator the widget drives
    pub calculator: Calculator,
    /// Side of the comparison
    pub role: WidgetRole,
    /// Correlator shared with the sibling widget; never blank
    pub page_id: Option<String>,
    /// UI language
    pub language: Language,
}

impl WidgetConfig {
    /// Config for `calculator` in `role`, no pageId, default language
    pub fn new(calculator: Calculator, role: WidgetRole) -> Self {
        Self {
            calculator,
            role,
            page_id: None,
            language: Language::default(),
        }
    }

    /// Set the correlator; blank ids count as none
    pub fn with_page_id(mut self, page_id: Option<&str>) -> Self {
        self.page_id = page_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self
    }

    /// Set the UI language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Parse `…/widgets/<calculator>-<role>?pageId=…&lang=…`
    ///
    /// An unsupported `lang` falls back to the default language.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        let slug = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .ok_or_else(|| ConfigError::UnknownWidget(url.path().to_string()))?;
        let (name, role) = slug
            .rsplit_once('-')
            .ok_or_else(|| ConfigError::UnknownWidget(slug.to_string()))?;
        let calculator: Calculator = name
            .parse()
            .map_err(|_| ConfigError::UnknownWidget(slug.to_string()))?;
        let role: WidgetRole = role
            .parse()
            .map_err(|_| ConfigError::UnknownWidget(slug.to_string()))?;

        let mut config = WidgetConfig::new(calculator, role);
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "pageId" => config = config.with_page_id(Some(value.as_ref())),
                "lang" => {
                    if let Some(language) = Language::from_tag(&value) {
                        config.language = language;
                    }
                }
                _ => {}
            }
        }
        Ok(config)
    }
}
