//! Test clocks: deterministic `Clock` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use smyslov_core::clock::Clock;
use tokio::sync::oneshot;

/// A clock frozen at a fixed point in time. Sleeps never complete.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[async_trait]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}

#[derive(Debug)]
struct ManualState {
    elapsed: Duration,
    sleepers: Vec<(Duration, oneshot::Sender<()>)>,
}

/// A clock that only moves when the test calls [`ManualClock::advance`].
///
/// Pending sleeps are observable so a test can wait until the code under test
/// is parked on a deadline before moving time.
#[derive(Debug)]
pub struct ManualClock {
    start: DateTime<Utc>,
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock starting at 2026-01-15 10:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Never in practice; the start date is a valid constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                sleepers: Vec::new(),
            }),
        }
    }

    /// Moves time forward, waking every sleep whose deadline has passed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap();
        state.elapsed += by;
        let now = state.elapsed;
        let (due, pending): (Vec<_>, Vec<_>) = state
            .sleepers
            .drain(..)
            .partition(|(deadline, _)| *deadline <= now);
        state.sleepers = pending;
        for (_, waker) in due {
            let _ = waker.send(());
        }
    }

    /// Number of sleeps currently parked on this clock.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn pending_sleepers(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.sleepers.retain(|(_, waker)| !waker.is_closed());
        state.sleepers.len()
    }

    /// Waits (in real time, up to five seconds) until exactly `count` sleeps
    /// are parked.
    ///
    /// # Panics
    ///
    /// Panics if the count is not reached in time.
    pub async fn wait_for_sleepers(&self, count: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.pending_sleepers() != count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "expected {count} pending sleepers, found {}",
            self.pending_sleepers()
        );
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.state.lock().unwrap().elapsed;
        self.start + chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::MAX)
    }

    async fn sleep(&self, duration: Duration) {
        let woken = {
            let mut state = self.state.lock().unwrap();
            if duration.is_zero() {
                return;
            }
            let deadline = state.elapsed + duration;
            let (waker, woken) = oneshot::channel();
            state.sleepers.push((deadline, waker));
            woken
        };
        let _ = woken.await;
    }
}
