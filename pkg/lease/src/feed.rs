use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use pkg_constants::lease::DEFAULT_CLOCK_STEP_MS;

/// Interval-driven virtual clock.
///
/// Publishes a monotonically non-decreasing millisecond value on a watch
/// channel, advancing by a fixed `step_ms` per interval tick. The step and
/// the wall interval are independent: a large step against a short interval
/// fast-forwards a session, and tests can skip the feed entirely and drive
/// the same channel shape by hand.
///
/// The published value is the sole time source for lease decisions; nothing
/// downstream reads the system clock.
pub struct ClockFeed {
    period: Duration,
    step_ms: i64,
    start_ms: i64,
}

impl ClockFeed {
    pub fn new(period: Duration, step_ms: i64) -> Self {
        let step = if step_ms > 0 { step_ms } else { DEFAULT_CLOCK_STEP_MS };
        Self {
            period,
            step_ms: step,
            start_ms: 0,
        }
    }

    /// Resume publishing from a previously stored virtual time.
    pub fn starting_at(mut self, start_ms: i64) -> Self {
        self.start_ms = start_ms;
        self
    }

    /// Start the feed as a background task. The task ends once every
    /// receiver is dropped.
    pub fn start(self) -> (tokio::task::JoinHandle<()>, watch::Receiver<i64>) {
        let (tx, rx) = watch::channel(self.start_ms);
        let handle = tokio::spawn(async move {
            info!(
                "ClockFeed started (period={}ms, step={}ms)",
                self.period.as_millis(),
                self.step_ms
            );

            let mut now_ms = self.start_ms;
            let mut interval = tokio::time::interval(self.period);
            // the first interval tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                now_ms = now_ms.saturating_add(self.step_ms);
                if tx.send(now_ms).is_err() {
                    break;
                }
            }
        });
        (handle, rx)
    }
}
