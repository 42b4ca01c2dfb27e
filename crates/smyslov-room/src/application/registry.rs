//! Per-room round handles and per-room locks.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use smyslov_core::model::RoomCode;
use smyslov_core::timer::DelayedTask;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::barrier::{RoundBarrier, RoundSignal};

#[derive(Debug, Default)]
struct RoundGate {
    closed: bool,
    warning: Option<DelayedTask>,
}

/// Handles of the round currently collecting answers in one room.
#[derive(Debug)]
pub(crate) struct ActiveRound {
    pub(crate) round_number: u8,
    pub(crate) barrier: RoundBarrier,
    gate: Mutex<RoundGate>,
}

impl ActiveRound {
    fn new(round_number: u8) -> Self {
        Self {
            round_number,
            barrier: RoundBarrier::new(),
            gate: Mutex::new(RoundGate::default()),
        }
    }

    /// Keeps `warning` until the round closes; cancels it at once if the
    /// round already closed.
    pub(crate) async fn arm_warning(&self, warning: DelayedTask) {
        let mut gate = self.gate.lock().await;
        if gate.closed {
            warning.cancel();
        } else {
            gate.warning = Some(warning);
        }
    }

    /// Runs `action` only while the window is open. [`ActiveRound::close`]
    /// waits for a running action, so nothing runs after it returns.
    pub(crate) async fn while_open<F>(&self, action: F) -> bool
    where
        F: Future<Output = ()>,
    {
        let gate = self.gate.lock().await;
        if gate.closed || !self.barrier.is_open() {
            return false;
        }
        action.await;
        drop(gate);
        true
    }

    /// Closes the window and cancels a pending warning.
    pub(crate) async fn close(&self) {
        let mut gate = self.gate.lock().await;
        gate.closed = true;
        if let Some(warning) = gate.warning.take() {
            warning.cancel();
        }
    }
}

/// Active rounds keyed by room code.
#[derive(Debug, Default)]
pub(crate) struct RoundRegistry {
    rounds: DashMap<RoomCode, Arc<ActiveRound>>,
}

impl RoundRegistry {
    /// Registers a new round, stopping any round it replaces.
    pub(crate) fn open(&self, code: RoomCode, round_number: u8) -> Arc<ActiveRound> {
        let round = Arc::new(ActiveRound::new(round_number));
        if let Some(previous) = self.rounds.insert(code, Arc::clone(&round)) {
            previous.barrier.release(RoundSignal::Stopped);
        }
        round
    }

    /// Whether `code` has a round still collecting answers.
    pub(crate) fn is_collecting(&self, code: &RoomCode) -> bool {
        self.rounds
            .get(code)
            .is_some_and(|round| round.barrier.is_open())
    }

    /// Releases the round in `code`, if any. Returns whether this call
    /// released it.
    pub(crate) fn release(&self, code: &RoomCode, signal: RoundSignal) -> bool {
        let round = self.rounds.get(code).map(|entry| Arc::clone(entry.value()));
        round.is_some_and(|round| round.barrier.release(signal))
    }

    /// Removes `round` if it is still the one registered for `code`.
    pub(crate) fn remove(&self, code: &RoomCode, round: &Arc<ActiveRound>) {
        self.rounds
            .remove_if(code, |_, registered| Arc::ptr_eq(registered, round));
    }
}

/// Per-room async locks serialising read-modify-write of room state.
#[derive(Debug, Default)]
pub(crate) struct RoomLocks {
    locks: DashMap<RoomCode, Arc<Mutex<()>>>,
}

impl RoomLocks {
    /// Waits for exclusive access to `code`.
    pub(crate) async fn acquire(&self, code: &RoomCode) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.locks.entry(code.clone()).or_default().value());
        lock.lock_owned().await
    }

    /// Drops the lock of a deleted room once nobody holds or awaits it.
    pub(crate) fn forget(&self, code: &RoomCode) {
        self.locks
            .remove_if(code, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RoomCode {
        "AB12".parse().unwrap()
    }

    #[test]
    fn test_release_reaches_registered_round() {
        let registry = RoundRegistry::default();
        let round = registry.open(code(), 1);

        assert!(registry.is_collecting(&code()));
        assert!(registry.release(&code(), RoundSignal::AllReady));

        assert_eq!(round.barrier.signal(), RoundSignal::AllReady);
        assert!(!registry.is_collecting(&code()));
    }

    #[test]
    fn test_release_without_round_is_noop() {
        let registry = RoundRegistry::default();

        assert!(!registry.release(&code(), RoundSignal::Stopped));
    }

    #[test]
    fn test_opening_a_new_round_stops_the_old_one() {
        let registry = RoundRegistry::default();
        let old = registry.open(code(), 1);

        let new = registry.open(code(), 2);

        assert_eq!(old.barrier.signal(), RoundSignal::Stopped);
        assert!(new.barrier.is_open());
    }

    #[test]
    fn test_remove_ignores_stale_round() {
        let registry = RoundRegistry::default();
        let old = registry.open(code(), 1);
        let _new = registry.open(code(), 2);

        registry.remove(&code(), &old);

        assert!(registry.is_collecting(&code()));
    }

    #[tokio::test]
    async fn test_closed_round_refuses_actions() {
        let round = ActiveRound::new(1);
        round.close().await;

        let ran = round.while_open(async {}).await;

        assert!(!ran);
    }

    #[tokio::test]
    async fn test_room_lock_is_forgotten_when_idle() {
        let locks = RoomLocks::default();
        let guard = locks.acquire(&code()).await;
        locks.forget(&code());
        assert_eq!(locks.locks.len(), 1);

        drop(guard);
        locks.forget(&code());

        assert!(locks.locks.is_empty());
    }
}
