//! Submission errors

use thiserror::Error;

use crate::model::FieldErrors;

/// Generic banner text when the backend gave no message
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Hint shown after transient failures exhaust every retry
pub const RETRY_HINT: &str = "The server may still be starting up. Please try again in a moment.";

/// Ways a submission can end without a result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Superseded or unmounted; never shown
    #[error("Submission aborted")]
    Aborted,

    /// Missing or rejected inputs; shown inline next to the fields
    #[error("Invalid inputs: {}", .fields.fields().join(", "))]
    Validation {
        /// Banner text, if the backend sent one
        message: Option<String>,
        /// Per-field reasons
        fields: FieldErrors,
    },

    /// Gateway or network failure that survived every retry
    #[error("Backend unavailable after {attempts} attempt(s): {message}")]
    Transient {
        /// Last gateway status; `None` after a network failure
        status: Option<u16>,
        /// Banner text
        message: String,
        /// Attempts made, including the first
        attempts: usize,
    },

    /// Terminal backend failure
    #[error("Request failed ({}): {message}", status_text(.status))]
    Fatal {
        /// HTTP status; `None` when no usable reply arrived
        status: Option<u16>,
        /// Backend `error_code`, if any
        error_code: Option<String>,
        /// Banner text
        message: String,
    },
}

fn status_text(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no status".to_string())
}

impl SubmitError {
    /// Whether the submission was cancelled
    pub fn is_aborted(&self) -> bool {
        matches!(self, SubmitError::Aborted)
    }

    /// Retry hint to show under the banner, if any
    pub fn retry_hint(&self) -> Option<&'static str> {
        match self {
            SubmitError::Transient { .. } => Some(RETRY_HINT),
            _ => None,
        }
    }

    /// Per-field reasons of a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmitError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Text for the error banner; `None` when nothing should be shown
    pub fn banner_message(&self) -> Option<String> {
        match self {
            SubmitError::Aborted => None,
            SubmitError::Validation { message, .. } => message.clone(),
            SubmitError::Transient { message, .. } | SubmitError::Fatal { message, .. } => {
                Some(message.clone())
            }
        }
    }
}

/// Failures below the HTTP status level
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No response: connect failure, reset, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// The HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl TransportError {
    /// Whether the failure left no response at all
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::Setup(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
