//! Doubling retry delay with up to 20% random extra, for transport retries.

use rand::Rng;
use std::time::Duration;

const JITTER_RATIO: f64 = 0.2;

/// Delay schedule for one oracle call's retries.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let next = base.max(Duration::from_millis(1));
        Self {
            next,
            max: max.max(next),
        }
    }

    /// Delay to wait before the next attempt. The first failure waits the
    /// base delay, each further failure doubles it up to `max`.
    pub fn fail(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);

        let spread_ms = (delay.as_millis() as f64 * JITTER_RATIO) as u64;
        delay + Duration::from_millis(rand::rng().random_range(0..=spread_ms))
    }
}
