//! Calculator Backend Client
//!
//! Posts calculator requests to the proxy (`/api/v1/calc/<name>`), retrying
//! gateway failures while the backend warms up.

mod error;
mod request_client;
mod retry;
mod transport;

pub use error::{SubmitError, TransportError, DEFAULT_ERROR_MESSAGE, RETRY_HINT};
pub use request_client::{RequestClient, SubmitStatus};
pub use retry::{RetryPolicy, DEFAULT_RETRY_DELAYS_MS, RETRIABLE_STATUSES};
pub use transport::{HttpReply, HttpTransport, Transport};

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default proxy base URL (local development server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
