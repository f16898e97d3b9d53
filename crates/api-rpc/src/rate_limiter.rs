//! Rate Limiter (Token Bucket)
//!
//! Keeps a misbehaving kiosk or staff client from starving the store.

use std::time::Instant;
use tokio::sync::Mutex;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    /// # Arguments
    /// * `max_burst` - Maximum burst size
    /// * `refill_per_sec` - Tokens added per second
    pub fn new(max_burst: u32, refill_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: max_burst as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_burst as f64,
            refill_per_sec: refill_per_sec as f64,
        }
    }

    /// Check if a request is allowed (consumes one token)
    pub async fn check(&self) -> bool {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_allows_within_burst() {
        let limiter = RateLimiter::new(10, 10);

        for _ in 0..10 {
            assert!(limiter.check().await);
        }
        assert!(!limiter.check().await);
    }

    #[tokio::test]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::new(5, 10); // 10 tokens/sec

        for _ in 0..5 {
            assert!(limiter.check().await);
        }
        assert!(!limiter.check().await);

        sleep(Duration::from_millis(300)).await;
        assert!(limiter.check().await);
    }
}
