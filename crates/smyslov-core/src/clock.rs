//! Clock abstraction for determinism.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Abstraction over time for deterministic behavior.
///
/// Round deadlines and warnings wait through [`Clock::sleep`], so a test
/// clock controls when they elapse.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Completes once `duration` has elapsed on this clock.
    async fn sleep(&self, duration: Duration);
}

/// Production clock that delegates to the system clock and the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_clock_sleeps_forward() {
        let clock = SystemClock;
        let before = clock.now();

        clock.sleep(Duration::from_millis(5)).await;

        assert!(clock.now() >= before);
    }
}
