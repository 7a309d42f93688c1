//! Resilient request client
//!
//! Submits a [`CalcRequest`] and retries gateway failures on a fixed
//! schedule while a cold backend starts up. Every suspension point (the
//! request itself and each retry delay) races the caller's cancellation
//! token, so a superseded submission stops as soon as it is cancelled.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::{HttpReply, HttpTransport, RetryPolicy, SubmitError, Transport, TransportError};
use super::error::DEFAULT_ERROR_MESSAGE;
use crate::config::ClientConfig;
use crate::model::{ApiErrorBody, CalcRequest, CalcResult, FieldErrors};

/// Progress of the most recent submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    /// No submission yet
    #[default]
    Idle,
    /// First attempt in flight
    Loading,
    /// Waiting for or running retry number `retry` (1-based)
    WarmingUp { retry: usize },
    /// Last submission settled
    Finished,
}

impl SubmitStatus {
    /// Whether a request is in flight or waiting to retry
    pub fn is_busy(&self) -> bool {
        matches!(self, SubmitStatus::Loading | SubmitStatus::WarmingUp { .. })
    }
}

/// Result of one attempt
enum Attempt {
    Done(Result<CalcResult, SubmitError>),
    Retry(SubmitError),
}

/// Calculator backend client with retry and cancellation
pub struct RequestClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    status: watch::Sender<SubmitStatus>,
}

impl RequestClient<HttpTransport> {
    /// HTTP client configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpTransport::new(config)?, config.retry_policy()))
    }
}

impl<T: Transport> RequestClient<T> {
    /// Client over `transport` following `policy`
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        let (status, _) = watch::channel(SubmitStatus::Idle);
        Self {
            transport,
            policy,
            status,
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retry schedule in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Watch the loading / warming-up state
    pub fn status(&self) -> watch::Receiver<SubmitStatus> {
        self.status.subscribe()
    }

    /// Submit `request`, retrying transient failures until `cancel` fires
    ///
    /// Missing required inputs fail with [`SubmitError::Validation`] before
    /// anything is sent. A cancelled submission resolves to
    /// [`SubmitError::Aborted`] and leaves the status channel untouched.
    pub async fn submit(
        &self,
        request: &CalcRequest,
        cancel: &CancellationToken,
    ) -> Result<CalcResult, SubmitError> {
        let missing = request.calculator().missing_fields(request.inputs());
        if !missing.is_empty() {
            debug!(fields = ?missing.fields(), "Rejected submission with missing fields");
            return Err(SubmitError::Validation {
                message: None,
                fields: missing,
            });
        }
        if cancel.is_cancelled() {
            return Err(SubmitError::Aborted);
        }

        let span = tracing::info_span!(
            "submission",
            calculator = %request.calculator(),
            id = %Uuid::new_v4(),
        );
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: &CalcRequest,
        cancel: &CancellationToken,
    ) -> Result<CalcResult, SubmitError> {
        let path = request.calculator().endpoint();
        let body = request.to_body();
        self.publish(cancel, SubmitStatus::Loading);

        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "Submission cancelled in flight");
                    return Err(SubmitError::Aborted);
                }
                reply = self.transport.post_json(&path, &body) => {
                    self.classify(reply, attempt + 1)
                }
            };

            let error = match outcome {
                Attempt::Done(result) => {
                    self.publish(cancel, SubmitStatus::Finished);
                    if result.is_ok() {
                        info!(attempts = attempt + 1, "Submission succeeded");
                    }
                    return result;
                }
                Attempt::Retry(error) => error,
            };

            let Some(delay) = self.policy.delay_before_retry(attempt) else {
                warn!(attempts = attempt + 1, "Giving up after transient failures");
                self.publish(cancel, SubmitStatus::Finished);
                return Err(error);
            };

            warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient failure, retrying"
            );
            self.publish(cancel, SubmitStatus::WarmingUp { retry: attempt + 1 });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "Submission cancelled while waiting to retry");
                    return Err(SubmitError::Aborted);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    fn classify(&self, reply: Result<HttpReply, TransportError>, attempts: usize) -> Attempt {
        let reply = match reply {
            Ok(reply) => reply,
            Err(TransportError::Network(message)) => {
                debug!(%message, "No response from backend");
                return Attempt::Retry(SubmitError::Transient {
                    status: None,
                    message: DEFAULT_ERROR_MESSAGE.to_string(),
                    attempts,
                });
            }
            Err(err) => {
                return Attempt::Done(Err(SubmitError::Fatal {
                    status: None,
                    error_code: None,
                    message: err.to_string(),
                }));
            }
        };

        if reply.is_success() {
            return Attempt::Done(serde_json::from_str::<CalcResult>(&reply.body).map_err(|e| {
                warn!(status = reply.status, error = %e, "Malformed result body");
                SubmitError::Fatal {
                    status: Some(reply.status),
                    error_code: None,
                    message: "Malformed response".to_string(),
                }
            }));
        }

        let body: ApiErrorBody = serde_json::from_str(&reply.body).unwrap_or_default();
        let message = body
            .message
            .clone()
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());

        if self.policy.is_retriable_status(reply.status) {
            return Attempt::Retry(SubmitError::Transient {
                status: Some(reply.status),
                message,
                attempts,
            });
        }

        if (400..500).contains(&reply.status) && !body.field_errors.is_empty() {
            return Attempt::Done(Err(SubmitError::Validation {
                message: Some(message),
                fields: FieldErrors::from_api(&body.field_errors),
            }));
        }

        Attempt::Done(Err(SubmitError::Fatal {
            status: Some(reply.status),
            error_code: body.error_code,
            message,
        }))
    }

    fn publish(&self, cancel: &CancellationToken, status: SubmitStatus) {
        if !cancel.is_cancelled() {
            self.status.send_replace(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct Fixed(u16, &'static str);

    impl Transport for Fixed {
        async fn post_json(&self, _path: &str, _body: &Value) -> Result<HttpReply, TransportError> {
            Ok(HttpReply::new(self.0, self.1))
        }
    }

    fn request() -> CalcRequest {
        CalcRequest::builder(crate::Calculator::Rl, crate::UnitSystem::Metric)
            .number("bore", 64.0)
            .number("stroke", 54.0)
            .number("rod_length", 110.0)
            .build()
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_fatal() {
        let client = RequestClient::new(Fixed(200, "<html>"), RetryPolicy::default());
        let err = client
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Fatal { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn test_unparsable_error_body_falls_back() {
        let client = RequestClient::new(Fixed(500, "oops"), RetryPolicy::default());
        let err = client
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.banner_message().as_deref(), Some(DEFAULT_ERROR_MESSAGE));
        assert_eq!(err.retry_hint(), None);
    }

    #[tokio::test]
    async fn test_backend_field_errors_are_validation() {
        let body = r#"{"error_code":"validation_error","message":"Invalid input","field_errors":[{"field":"inputs.bore","reason":"must be > 0"}]}"#;
        let client = RequestClient::new(Fixed(422, body), RetryPolicy::default());
        let err = client
            .submit(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("bore"), Some("must be > 0"));
        assert_eq!(err.banner_message().as_deref(), Some("Invalid input"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_sends_nothing() {
        let client = RequestClient::new(Fixed(200, "{}"), RetryPolicy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(client.submit(&request(), &cancel).await, Err(SubmitError::Aborted));
        assert_eq!(*client.status().borrow(), SubmitStatus::Idle);
    }
}
