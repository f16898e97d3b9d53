// Exponential backoff for transient store failures

use std::time::Duration;

/// Bounded exponential backoff.
///
/// delay = base * factor^attempt, capped at max. The ingest loop resets it
/// after the first successful commit so an isolated hiccup does not slow
/// the pipeline down permanently.
#[derive(Debug)]
pub struct Backoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
    factor: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            factor: 2.0,
            attempt: 0,
        }
    }

    /// Delay to apply before the next retry; advances the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let raw = self.base_delay_ms as f64 * self.factor.powi(self.attempt as i32);
        let delay_ms = (raw as u64).min(self.max_delay_ms);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(delay_ms)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_and_cap() {
        let mut backoff = Backoff::new(100, 1000);
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn reset_restarts_the_sequence() {
        let mut backoff = Backoff::new(50, 500);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(50));
    }
}
