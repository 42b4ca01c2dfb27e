//! Shared dependencies of the room handlers.

use std::sync::{Arc, Mutex};

use smyslov_core::clock::Clock;
use smyslov_core::model::RoomCode;
use smyslov_core::notifier::Notifier;
use smyslov_core::repository::GameRepository;
use smyslov_core::rng::DeterministicRng;

use super::registry::{RoomLocks, RoundRegistry};
use crate::config::GameSettings;

/// Ports, settings and per-room runtime state handed to every handler.
///
/// Cloning is cheap; clones share the same round registry and room locks,
/// so every handler for one engine must use clones of one context.
#[derive(Clone)]
pub struct EngineContext {
    /// Storage.
    pub repo: Arc<dyn GameRepository>,
    /// Outbound delivery.
    pub notifier: Arc<dyn Notifier>,
    /// Time source for deadlines and event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Randomness for card picks and room codes.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Tunables.
    pub settings: GameSettings,
    pub(crate) rounds: Arc<RoundRegistry>,
    pub(crate) locks: Arc<RoomLocks>,
}

impl EngineContext {
    /// Builds a context with empty round and lock tables.
    #[must_use]
    pub fn new(
        repo: Arc<dyn GameRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        settings: GameSettings,
    ) -> Self {
        Self {
            repo,
            notifier,
            clock,
            rng,
            settings,
            rounds: Arc::new(RoundRegistry::default()),
            locks: Arc::new(RoomLocks::default()),
        }
    }

    /// Whether `code` has a round whose answer window is open.
    #[must_use]
    pub fn is_collecting(&self, code: &RoomCode) -> bool {
        self.rounds.is_collecting(code)
    }
}
