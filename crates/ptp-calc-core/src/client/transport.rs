//! HTTP transport
//!
//! [`Transport`] is the only place the client touches the network. The
//! production implementation posts JSON with `reqwest`; tests script replies
//! without sockets.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::TransportError;
use crate::config::ClientConfig;

/// Status and raw body of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Raw body; empty when an error reply's body was unreadable
    pub body: String,
}

impl HttpReply {
    /// Reply with `status` and `body`
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts a JSON body to a backend path
pub trait Transport: Send + Sync {
    /// Post `body` as JSON to `path`, relative to the backend base URL
    fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<HttpReply, TransportError>> + Send;
}

/// `reqwest`-backed transport rooted at a base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Transport with the base URL, timeout and user agent from `config`
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ptp-calc/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<HttpReply, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        match response.text().await {
            Ok(body) => Ok(HttpReply::new(status.as_u16(), body)),
            // Error replies are classified by status; their body is optional
            Err(err) if !status.is_success() => {
                debug!(status = status.as_u16(), error = %err, "Unreadable error body");
                Ok(HttpReply::new(status.as_u16(), String::new()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
