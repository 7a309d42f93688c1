//! Height reporting
//!
//! Widgets tell the host their content height so the iframe can be sized.
//! A height is reported at mount and on every change, driven by layout
//! notifications; without them the height is polled every 500 ms.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::bridge::{FrameBridge, FrameSink};

/// Polling period when layout notifications are unavailable
pub const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Suppresses zero and repeated heights
#[derive(Debug, Clone, Default)]
pub struct HeightReporter {
    last: u32,
}

impl HeightReporter {
    /// Reporter that has sent nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The height to send, if it should be sent
    pub fn observe(&mut self, height: u32) -> Option<u32> {
        if height == 0 || height == self.last {
            return None;
        }
        self.last = height;
        Some(height)
    }

    /// Last reported height
    pub fn last_sent(&self) -> Option<u32> {
        (self.last != 0).then_some(self.last)
    }
}

/// Report heights until `shutdown` fires
///
/// `layout` delivers a notification whenever layout may have changed. When
/// it is `None`, or its sender goes away, the reporter falls back to
/// polling `measure`.
pub async fn run_resize_reporter<M, S>(
    bridge: &FrameBridge,
    mut measure: M,
    layout: Option<watch::Receiver<()>>,
    sink: &S,
    shutdown: CancellationToken,
) where
    M: FnMut() -> u32,
    S: FrameSink + ?Sized,
{
    let mut reporter = HeightReporter::new();
    let mut emit = |reporter: &mut HeightReporter| {
        if let Some(height) = reporter.observe(measure()) {
            if let Some(message) = bridge.resize(height) {
                sink.post(message);
            }
        }
    };

    emit(&mut reporter);

    if let Some(mut layout) = layout {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                changed = layout.changed() => {
                    if changed.is_err() {
                        debug!("Layout notifications ended, polling height instead");
                        break;
                    }
                    emit(&mut reporter);
                }
            }
        }
    }

    let mut interval = tokio::time::interval(RESIZE_POLL_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => emit(&mut reporter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_coalesces() {
        let mut reporter = HeightReporter::new();
        assert_eq!(reporter.observe(0), None);
        assert_eq!(reporter.observe(480), Some(480));
        assert_eq!(reporter.observe(480), None);
        assert_eq!(reporter.observe(520), Some(520));
        assert_eq!(reporter.observe(0), None);
        assert_eq!(reporter.last_sent(), Some(520));
    }
}
