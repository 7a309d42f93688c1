//! Frame protocol rejections

use thiserror::Error;

/// Why an inbound frame message was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Sender is not on the allowlist
    DisallowedOrigin,
    /// Not a valid message object
    Malformed(String),
    /// `type` is not part of the protocol
    UnknownType(String),
    /// A message for another calculator's widgets
    WrongCalculator(String),
    /// A known message this widget does not consume
    UnexpectedKind(String),
    /// Receiver has no pageId to correlate with
    MissingCorrelator,
    /// Sender tagged a different pageId, or none
    CorrelatorMismatch {
        /// This widget's pageId
        expected: String,
        /// The message's pageId
        received: Option<String>,
    },
    /// Language tag outside the supported set
    UnsupportedLanguage(String),
}

/// A dropped inbound message; never surfaced to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Rejected message from '{origin}': {reason:?}")]
pub struct ProtocolRejected {
    /// Origin the message came from
    pub origin: String,
    /// Why it was dropped
    pub reason: RejectReason,
}

impl ProtocolRejected {
    /// Rejection of a message from `origin`
    pub fn new(origin: &str, reason: RejectReason) -> Self {
        Self {
            origin: origin.to_string(),
            reason,
        }
    }
}
