//! Reconnect delay policy.

use std::time::Duration;

/// Decides how long to wait before the next connection attempt.
///
/// Callers may swap in their own policy (e.g. exponential backoff); the
/// shipped [`FixedInterval`] retries at a constant cadence.
pub trait ReconnectStrategy: Send {
    /// Delay before the next attempt.
    fn next_delay(&mut self) -> Duration;

    /// Called after a successful handshake so stateful strategies can start
    /// over from their base delay.
    fn reset(&mut self);
}

/// Fixed-interval reconnect strategy: every retry waits the same duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    /// Create a strategy that waits `interval` between attempts.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl ReconnectStrategy for FixedInterval {
    fn next_delay(&mut self) -> Duration {
        self.interval
    }

    fn reset(&mut self) {}
}
