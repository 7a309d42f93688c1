//! Retry schedule

use std::time::Duration;

/// Delays before each retry, in milliseconds
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 3] = [800, 1600, 2400];

/// Gateway statuses a cold backend answers with while starting
pub const RETRIABLE_STATUSES: [u16; 3] = [502, 503, 504];

/// Fixed-delay retry schedule
///
/// Attempt `n` (0-based) is followed by `delays[n]` before attempt `n + 1`;
/// there is no delay after the last attempt, so the client makes
/// `delays.len() + 1` attempts at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
    retriable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_delays_ms(&DEFAULT_RETRY_DELAYS_MS)
    }
}

impl RetryPolicy {
    /// Schedule with the given delays and the default gateway statuses
    pub fn from_delays_ms(delays_ms: &[u64]) -> Self {
        Self {
            delays: delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            retriable_statuses: RETRIABLE_STATUSES.to_vec(),
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::from_delays_ms(&[])
    }

    /// First attempt plus one per delay
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    /// Delay to wait after the failed `attempt` (0-based); `None` after the last
    pub fn delay_before_retry(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    /// Whether a reply with `status` is worth retrying
    pub fn is_retriable_status(&self, status: u16) -> bool {
        self.retriable_statuses.contains(&status)
    }
}
