//! Widget state
//!
//! One [`Widget`] per embedded calculator instance. It owns the only
//! cancellation token for its in-flight submission and applies outcomes
//! only while their ticket is current, so a superseded request can never
//! overwrite newer state.
//!
//! The widget is never borrowed across the network call: take a ticket with
//! [`Widget::begin_submission`], await
//! [`RequestClient::submit`](crate::client::RequestClient::submit) with the
//! ticket's token, then hand the outcome to [`Widget::complete_submission`].
//! Inbound messages and newer submissions are applied in between.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{SubmitError, DEFAULT_ERROR_MESSAGE};
use crate::comparison::{compare_for, Comparison};
use crate::config::{WidgetConfig, WidgetRole};
use crate::model::{Baseline, CalcRequest, CalcResult, FieldErrors, RequestBuilder};
use crate::sync::{FrameBridge, InboundEvent, Language, OutboundMessage};
use crate::units::UnitSystem;

/// Banner shown above the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayError {
    /// Banner text
    pub message: String,
    /// Hint shown under the banner after exhausted retries
    pub retry_hint: Option<&'static str>,
}

/// Persistent status shown instead of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A "new" widget without a pageId can never accept a baseline
    MissingPageId,
}

/// Handle for one submission
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,
    token: CancellationToken,
}

impl SubmissionTicket {
    /// Sequence number of the submission
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token that cancels the request
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// State of one embedded calculator
#[derive(Debug)]
pub struct Widget {
    config: WidgetConfig,
    bridge: FrameBridge,
    unit_system: UnitSystem,
    language: Language,
    result: Option<CalcResult>,
    baseline: Option<Baseline>,
    error: Option<DisplayError>,
    field_errors: FieldErrors,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl Widget {
    /// Widget embedded by the page at `referrer`
    pub fn new(config: WidgetConfig, referrer: Option<&str>) -> Self {
        let bridge = FrameBridge::new(
            config.calculator,
            config.role,
            config.page_id.clone(),
            referrer,
        );
        Self::with_bridge(config, bridge)
    }

    /// Widget with a preconfigured bridge
    pub fn with_bridge(config: WidgetConfig, bridge: FrameBridge) -> Self {
        Self {
            language: config.language,
            config,
            bridge,
            unit_system: UnitSystem::default(),
            result: None,
            baseline: None,
            error: None,
            field_errors: FieldErrors::new(),
            generation: 0,
            in_flight: None,
        }
    }

    /// Settings the widget was created with
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Frame protocol endpoint
    pub fn bridge(&self) -> &FrameBridge {
        &self.bridge
    }

    /// Display unit system
    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    /// Change the display unit system; results are converted, not refetched
    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.unit_system = unit_system;
    }

    /// Current UI language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Latest applied result
    pub fn result(&self) -> Option<&CalcResult> {
        self.result.as_ref()
    }

    /// Latest accepted baseline
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Banner error of the last submission
    pub fn error(&self) -> Option<&DisplayError> {
        self.error.as_ref()
    }

    /// Inline field errors of the last submission
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Whether a submission is outstanding
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Persistent notice to show, if any
    pub fn notice(&self) -> Option<Notice> {
        (self.config.role == WidgetRole::New && self.config.page_id.is_none())
            .then_some(Notice::MissingPageId)
    }

    /// Request builder for the current unit system
    ///
    /// A sprocket "new" widget with a baseline attaches the baseline's
    /// normalized inputs under `baseline`.
    pub fn request_builder(&self) -> RequestBuilder {
        let builder = CalcRequest::builder(self.config.calculator, self.unit_system);
        if self.config.role != WidgetRole::New {
            return builder;
        }
        match self
            .baseline
            .as_ref()
            .and_then(|b| self.config.calculator.baseline_inputs(b.result()))
        {
            Some(inputs) => builder.value("baseline", inputs),
            None => builder,
        }
    }

    /// Start a submission, cancelling any still in flight
    pub fn begin_submission(&mut self) -> SubmissionTicket {
        if let Some(previous) = self.in_flight.take() {
            debug!(generation = self.generation, "Superseding in-flight submission");
            previous.cancel();
        }
        self.generation += 1;
        self.error = None;
        self.field_errors = FieldErrors::new();

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        SubmissionTicket {
            generation: self.generation,
            token,
        }
    }

    /// Apply a submission outcome
    ///
    /// Stale tickets and aborted outcomes change nothing. Returns the
    /// messages to post to the host.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<CalcResult, SubmitError>,
    ) -> Vec<OutboundMessage> {
        if ticket.generation != self.generation || ticket.token.is_cancelled() {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Ignoring outcome of superseded submission"
            );
            return Vec::new();
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                let outbound = self.bridge.result_message(&result);
                self.result = Some(result);
                outbound.into_iter().collect()
            }
            Err(SubmitError::Aborted) => Vec::new(),
            Err(SubmitError::Validation { message, fields }) => {
                self.field_errors = fields;
                self.error = message.map(|message| DisplayError {
                    message,
                    retry_hint: None,
                });
                Vec::new()
            }
            Err(err) => {
                self.error = Some(DisplayError {
                    message: err
                        .banner_message()
                        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
                    retry_hint: err.retry_hint(),
                });
                Vec::new()
            }
        }
    }

    /// Handle a message event from `origin`
    pub fn handle_message(&mut self, origin: &str, data: &Value) -> Vec<OutboundMessage> {
        match self.bridge.handle_inbound(origin, data) {
            Ok(InboundEvent::Baseline(baseline)) => {
                self.baseline = Some(baseline);
                Vec::new()
            }
            Ok(InboundEvent::LanguageChanged(language)) => {
                self.language = language;
                self.bridge.lang_ack(language).into_iter().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Deltas of the current result against the baseline, in display units
    pub fn comparison(&self) -> Option<Comparison> {
        let result = self.result.as_ref()?;
        let baseline = self.baseline.as_ref()?;
        Some(compare_for(
            self.config.calculator,
            result,
            baseline.result(),
            self.unit_system,
        ))
    }

    /// Cancel any in-flight submission
    pub fn unmount(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        self.unmount();
    }
}
