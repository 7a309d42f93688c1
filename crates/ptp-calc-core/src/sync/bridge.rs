//! Frame bridge
//!
//! Applies the origin allowlist and pageId correlation to every inbound
//! message and addresses outbound messages to the host page. One bridge per
//! widget; it holds no mutable state.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::message::{FrameMessage, Language};
use super::{OriginAllowlist, ProtocolRejected, RejectReason};
use crate::calculator::Calculator;
use crate::config::WidgetRole;
use crate::model::{Baseline, CalcResult};

/// What an accepted inbound message means for the widget
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Replace the current baseline
    Baseline(Baseline),
    /// Switch UI language; the host expects an ack
    LanguageChanged(Language),
}

/// A message ready to post to the host page
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Origin the message must be posted to
    pub target_origin: String,
    /// The message itself
    pub message: FrameMessage,
}

/// Receives outbound messages in dispatch order
pub trait FrameSink {
    /// Post one message
    fn post(&self, message: OutboundMessage);
}

/// In-process sink backed by an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSink {
    /// Sink plus the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FrameSink for ChannelSink {
    fn post(&self, message: OutboundMessage) {
        if self.tx.send(message).is_err() {
            debug!("Frame sink closed, message dropped");
        }
    }
}

/// Post every message in order
pub fn dispatch_all<S: FrameSink + ?Sized>(
    sink: &S,
    messages: impl IntoIterator<Item = OutboundMessage>,
) {
    for message in messages {
        sink.post(message);
    }
}

/// Protocol endpoint of one widget
#[derive(Debug, Clone)]
pub struct FrameBridge {
    calculator: Calculator,
    role: WidgetRole,
    page_id: Option<String>,
    allowlist: OriginAllowlist,
    target_origin: Option<String>,
}

impl FrameBridge {
    /// Bridge for a widget embedded by the page at `referrer`
    ///
    /// Outbound messages are only produced when the referrer's origin is on
    /// the host allowlist.
    pub fn new(
        calculator: Calculator,
        role: WidgetRole,
        page_id: Option<String>,
        referrer: Option<&str>,
    ) -> Self {
        Self::with_allowlist(calculator, role, page_id, referrer, OriginAllowlist::host())
    }

    /// Like [`FrameBridge::new`] with a custom allowlist
    pub fn with_allowlist(
        calculator: Calculator,
        role: WidgetRole,
        page_id: Option<String>,
        referrer: Option<&str>,
        allowlist: OriginAllowlist,
    ) -> Self {
        let target_origin = referrer.and_then(|r| allowlist.referrer_origin(r));
        if target_origin.is_none() {
            debug!(?referrer, "No allowed host origin; outbound messages disabled");
        }
        Self {
            calculator,
            role,
            page_id: page_id.filter(|id| !id.trim().is_empty()),
            allowlist,
            target_origin,
        }
    }

    /// Calculator this widget belongs to
    pub fn calculator(&self) -> Calculator {
        self.calculator
    }

    /// Role this widget plays
    pub fn role(&self) -> WidgetRole {
        self.role
    }

    /// Non-blank correlator, if any
    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    /// Host origin outbound messages are addressed to
    pub fn target_origin(&self) -> Option<&str> {
        self.target_origin.as_deref()
    }

    /// Validate an inbound message from `origin`
    ///
    /// Rejections are logged at debug level and otherwise ignored by callers.
    pub fn handle_inbound(&self, origin: &str, data: &Value) -> Result<InboundEvent, ProtocolRejected> {
        self.accept(origin, data)
            .map_err(|reason| ProtocolRejected::new(origin, reason))
            .inspect_err(|rejected| {
                debug!(origin = %rejected.origin, reason = ?rejected.reason, "Dropped frame message")
            })
    }

    fn accept(&self, origin: &str, data: &Value) -> Result<InboundEvent, RejectReason> {
        if !self.allowlist.is_allowed(origin) {
            return Err(RejectReason::DisallowedOrigin);
        }
        match FrameMessage::parse(data)? {
            FrameMessage::LanguageRequest { language } => Language::from_tag(&language)
                .map(InboundEvent::LanguageChanged)
                .ok_or(RejectReason::UnsupportedLanguage(language)),
            FrameMessage::Baseline {
                calculator,
                page_id,
                payload,
            } => {
                if calculator != self.calculator {
                    return Err(RejectReason::WrongCalculator(calculator.to_string()));
                }
                if self.role != WidgetRole::New {
                    return Err(RejectReason::UnexpectedKind(calculator.baseline_message_type()));
                }
                let expected = self.page_id.as_deref().ok_or(RejectReason::MissingCorrelator)?;
                if page_id.as_deref() != Some(expected) {
                    return Err(RejectReason::CorrelatorMismatch {
                        expected: expected.to_string(),
                        received: page_id,
                    });
                }
                Ok(InboundEvent::Baseline(Baseline::new(page_id, *payload)))
            }
            other => Err(RejectReason::UnexpectedKind(
                other.type_name().unwrap_or_default(),
            )),
        }
    }

    /// Address `message` to the host, if there is an allowed host
    pub fn outbound(&self, message: FrameMessage) -> Option<OutboundMessage> {
        let target_origin = self.target_origin.clone()?;
        Some(OutboundMessage {
            target_origin,
            message,
        })
    }

    /// Publish a fresh result; only "original" widgets do
    pub fn result_message(&self, result: &CalcResult) -> Option<OutboundMessage> {
        if self.role != WidgetRole::Original {
            return None;
        }
        self.outbound(FrameMessage::OriginalResult {
            calculator: self.calculator,
            page_id: self.page_id.clone(),
            payload: Box::new(result.clone()),
        })
    }

    /// Acknowledge a language change
    pub fn lang_ack(&self, language: Language) -> Option<OutboundMessage> {
        self.outbound(FrameMessage::LangAck { language })
    }

    /// Report the widget height
    pub fn resize(&self, height: u32) -> Option<OutboundMessage> {
        self.outbound(FrameMessage::Resize { height })
    }
}
