//! Frame message envelopes
//!
//! | `type`                           | fields                 | direction          |
//! |----------------------------------|------------------------|--------------------|
//! | `ptp:calc:<name>:originalResult` | `pageId?`, `payload`   | original → host    |
//! | `ptp:calc:<name>:baseline`       | `pageId?`, `payload`   | host → new         |
//! | `ptp:resize`                     | `height`               | widget → host      |
//! | `ptp:lang:ack`                   | `language`             | widget → host      |
//! | (none)                           | `language`             | host → widget      |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::RejectReason;
use crate::calculator::Calculator;
use crate::model::CalcResult;

/// `type` of a height report
pub const RESIZE_TYPE: &str = "ptp:resize";
/// `type` of a language acknowledgement
pub const LANG_ACK_TYPE: &str = "ptp:lang:ack";
const CALC_PREFIX: &str = "ptp:calc:";

/// Widget UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Brazilian Portuguese
    #[serde(rename = "pt_BR")]
    PtBr,
    /// US English
    #[serde(rename = "en_US")]
    #[default]
    EnUs,
    /// Spanish
    #[serde(rename = "es_ES")]
    EsEs,
}

impl Language {
    /// Every supported language
    pub const ALL: [Language; 3] = [Language::PtBr, Language::EnUs, Language::EsEs];

    /// Wire tag (`pt_BR`)
    pub fn tag(&self) -> &'static str {
        match self {
            Language::PtBr => "pt_BR",
            Language::EnUs => "en_US",
            Language::EsEs => "es_ES",
        }
    }

    /// Exact tag match; anything else is unsupported
    pub fn from_tag(tag: &str) -> Option<Self> {
        Language::ALL.into_iter().find(|l| l.tag() == tag)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One cross-frame message
#[derive(Debug, Clone, PartialEq)]
pub enum FrameMessage {
    /// A result relayed to a "new" widget
    Baseline {
        /// Calculator the result belongs to
        calculator: Calculator,
        /// Correlator copied from the original widget
        page_id: Option<String>,
        /// The relayed result
        payload: Box<CalcResult>,
    },
    /// A result an "original" widget publishes
    OriginalResult {
        /// Calculator the result belongs to
        calculator: Calculator,
        /// Correlator of the original widget
        page_id: Option<String>,
        /// The published result
        payload: Box<CalcResult>,
    },
    /// Height report to the host
    Resize {
        /// Content height in CSS pixels
        height: u32,
    },
    /// Acknowledges a language request
    LangAck {
        /// Language now in use
        language: Language,
    },
    /// Untyped `{language}` request from the host; the tag is unchecked
    LanguageRequest {
        /// Requested tag, as sent
        language: String,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(rename = "pageId", default, skip_serializing_if = "Option::is_none")]
    page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

impl FrameMessage {
    /// Wire `type` string; `None` for the untyped language request
    pub fn type_name(&self) -> Option<String> {
        match self {
            FrameMessage::Baseline { calculator, .. } => Some(calculator.baseline_message_type()),
            FrameMessage::OriginalResult { calculator, .. } => {
                Some(calculator.original_result_message_type())
            }
            FrameMessage::Resize { .. } => Some(RESIZE_TYPE.to_string()),
            FrameMessage::LangAck { .. } => Some(LANG_ACK_TYPE.to_string()),
            FrameMessage::LanguageRequest { .. } => None,
        }
    }

    /// Wire JSON of the message
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = Envelope {
            kind: self.type_name(),
            ..Envelope::default()
        };
        match self {
            FrameMessage::Baseline {
                page_id, payload, ..
            }
            | FrameMessage::OriginalResult {
                page_id, payload, ..
            } => {
                envelope.page_id = page_id.clone();
                envelope.payload = Some(serde_json::to_value(payload)?);
            }
            FrameMessage::Resize { height } => envelope.height = Some(*height),
            FrameMessage::LangAck { language } => {
                envelope.language = Some(language.tag().to_string())
            }
            FrameMessage::LanguageRequest { language } => {
                envelope.language = Some(language.clone())
            }
        }
        serde_json::to_value(envelope)
    }

    /// Decode an inbound message
    pub fn parse(data: &Value) -> Result<Self, RejectReason> {
        let envelope: Envelope = serde_json::from_value(data.clone())
            .map_err(|e| RejectReason::Malformed(e.to_string()))?;

        let Some(kind) = envelope.kind else {
            return match envelope.language {
                Some(language) => Ok(FrameMessage::LanguageRequest { language }),
                None => Err(RejectReason::Malformed("missing type".to_string())),
            };
        };

        match kind.as_str() {
            RESIZE_TYPE => {
                let height = envelope
                    .height
                    .ok_or_else(|| RejectReason::Malformed("resize without height".to_string()))?;
                Ok(FrameMessage::Resize { height })
            }
            LANG_ACK_TYPE => {
                let tag = envelope.language.unwrap_or_default();
                let language = Language::from_tag(&tag)
                    .ok_or(RejectReason::UnsupportedLanguage(tag))?;
                Ok(FrameMessage::LangAck { language })
            }
            _ => parse_calc_message(&kind, envelope.page_id, envelope.payload),
        }
    }
}

fn parse_calc_message(
    kind: &str,
    page_id: Option<String>,
    payload: Option<Value>,
) -> Result<FrameMessage, RejectReason> {
    let unknown = || RejectReason::UnknownType(kind.to_string());
    let (name, suffix) = kind
        .strip_prefix(CALC_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .ok_or_else(unknown)?;
    let calculator: Calculator = name.parse().map_err(|_| unknown())?;
    if suffix != "baseline" && suffix != "originalResult" {
        return Err(unknown());
    }

    let payload = payload.ok_or_else(|| RejectReason::Malformed("missing payload".to_string()))?;
    let payload: CalcResult =
        serde_json::from_value(payload).map_err(|e| RejectReason::Malformed(e.to_string()))?;
    let payload = Box::new(payload);

    Ok(if suffix == "baseline" {
        FrameMessage::Baseline {
            calculator,
            page_id,
            payload,
        }
    } else {
        FrameMessage::OriginalResult {
            calculator,
            page_id,
            payload,
        }
    })
}

/// Host-side relay: turn an original widget's result into the baseline
/// message for its sibling
pub fn relay_as_baseline(message: FrameMessage) -> Option<FrameMessage> {
    match message {
        FrameMessage::OriginalResult {
            calculator,
            page_id,
            payload,
        } => Some(FrameMessage::Baseline {
            calculator,
            page_id,
            payload,
        }),
        _ => None,
    }
}
