//! Rate limiting for diagnostic log lines.

use std::time::Duration;
use tokio::time::Instant;

/// Allows an action at most once per interval.
///
/// The first call is always allowed.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl LogThrottle {
    /// Creates a throttle with the given minimum gap.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true and records the time if the interval has elapsed.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Same as [`LogThrottle::ready`] with an explicit clock reading.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
