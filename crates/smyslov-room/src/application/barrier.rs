//! Single-shot readiness barrier for one round.
//!
//! The first release wins; later releases are ignored, so the last ready
//! player, the deadline and a host stop can race freely.

use tokio::sync::watch;

/// State of a round's answer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundSignal {
    /// Still collecting answers.
    Open,
    /// Every present player is ready.
    AllReady,
    /// The deadline passed.
    Expired,
    /// The room was stopped.
    Stopped,
}

/// Barrier released once per round.
#[derive(Debug)]
pub struct RoundBarrier {
    state: watch::Sender<RoundSignal>,
}

impl Default for RoundBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundBarrier {
    /// Creates an open barrier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(RoundSignal::Open),
        }
    }

    /// Releases the barrier with `signal`. Returns `false` if it was already
    /// released, in which case nothing changes.
    pub fn release(&self, signal: RoundSignal) -> bool {
        if signal == RoundSignal::Open {
            return false;
        }
        self.state.send_if_modified(|state| {
            if *state == RoundSignal::Open {
                *state = signal;
                true
            } else {
                false
            }
        })
    }

    /// Current signal.
    #[must_use]
    pub fn signal(&self) -> RoundSignal {
        *self.state.borrow()
    }

    /// Whether answers are still being collected.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.signal() == RoundSignal::Open
    }

    /// Waits until the barrier is released and returns the winning signal.
    pub async fn wait(&self) -> RoundSignal {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|state| *state != RoundSignal::Open).await {
            Ok(state) => *state,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => RoundSignal::Stopped,
        }
    }
}
