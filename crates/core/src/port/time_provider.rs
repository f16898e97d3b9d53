// Time Provider Port (for testability)

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed, manually-advanced clock for deterministic tests
    pub struct MockTimeProvider {
        now: AtomicI64,
    }

    impl MockTimeProvider {
        pub fn new(now_millis: i64) -> Self {
            Self {
                now: AtomicI64::new(now_millis),
            }
        }

        pub fn advance(&self, delta_millis: i64) {
            self.now.fetch_add(delta_millis, Ordering::SeqCst);
        }
    }

    impl TimeProvider for MockTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
