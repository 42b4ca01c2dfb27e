//! Test repositories: `GameRepository` implementations for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use smyslov_core::error::DomainError;
use smyslov_core::model::{Card, Player, Room, RoomCode, UserId};
use smyslov_core::repository::GameRepository;

#[derive(Debug, Default)]
struct Store {
    rooms: BTreeMap<RoomCode, Room>,
    players: Vec<Player>,
    cards: Vec<Card>,
}

/// A repository holding everything in memory. Can be switched to fail every
/// call to simulate an outage in the middle of a round.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    unavailable: AtomicBool,
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with `cards`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_cards(cards: Vec<Card>) -> Self {
        let repo = Self::new();
        repo.store.lock().unwrap().cards = cards;
        repo
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a stored room.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn room(&self, code: &RoomCode) -> Option<Room> {
        self.store.lock().unwrap().rooms.get(code).cloned()
    }

    /// Snapshot of one player.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn player(&self, code: &RoomCode, user_id: UserId) -> Option<Player> {
        self.store
            .lock()
            .unwrap()
            .players
            .iter()
            .find(|p| &p.room_code == code && p.user_id == user_id)
            .cloned()
    }

    /// Snapshot of every card, global and room-scoped.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn cards(&self) -> Vec<Card> {
        self.store.lock().unwrap().cards.clone()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GameRepository for InMemoryRepository {
    async fn get_room(&self, code: &RoomCode) -> Result<Option<Room>, DomainError> {
        self.check()?;
        Ok(self.room(code))
    }

    async fn save_room(&self, room: &Room) -> Result<(), DomainError> {
        self.check()?;
        self.store
            .lock()
            .unwrap()
            .rooms
            .insert(room.code.clone(), room.clone());
        Ok(())
    }

    async fn delete_room(&self, code: &RoomCode) -> Result<(), DomainError> {
        self.check()?;
        self.store.lock().unwrap().rooms.remove(code);
        Ok(())
    }

    async fn list_players(&self, code: &RoomCode) -> Result<Vec<Player>, DomainError> {
        self.check()?;
        let mut players: Vec<Player> = self
            .store
            .lock()
            .unwrap()
            .players
            .iter()
            .filter(|p| &p.room_code == code)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.joined_seq);
        Ok(players)
    }

    async fn find_player(&self, user_id: UserId) -> Result<Vec<Player>, DomainError> {
        self.check()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .players
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_player(&self, player: &Player) -> Result<(), DomainError> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        match store
            .players
            .iter_mut()
            .find(|p| p.room_code == player.room_code && p.user_id == player.user_id)
        {
            Some(existing) => *existing = player.clone(),
            None => store.players.push(player.clone()),
        }
        Ok(())
    }

    async fn delete_player(&self, code: &RoomCode, user_id: UserId) -> Result<(), DomainError> {
        self.check()?;
        self.store
            .lock()
            .unwrap()
            .players
            .retain(|p| !(&p.room_code == code && p.user_id == user_id));
        Ok(())
    }

    async fn list_cards(
        &self,
        room: Option<&RoomCode>,
        is_blitz: bool,
    ) -> Result<Vec<Card>, DomainError> {
        self.check()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .cards
            .iter()
            .filter(|c| c.is_blitz == is_blitz && c.room_code.as_ref() == room)
            .cloned()
            .collect())
    }

    async fn save_cards(&self, cards: &[Card]) -> Result<(), DomainError> {
        self.check()?;
        self.store.lock().unwrap().cards.extend_from_slice(cards);
        Ok(())
    }

    async fn delete_cards_for_room(&self, code: &RoomCode) -> Result<(), DomainError> {
        self.check()?;
        self.store
            .lock()
            .unwrap()
            .cards
            .retain(|c| c.room_code.as_ref() != Some(code));
        Ok(())
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository;

fn refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl GameRepository for FailingRepository {
    async fn get_room(&self, _code: &RoomCode) -> Result<Option<Room>, DomainError> {
        refused()
    }

    async fn save_room(&self, _room: &Room) -> Result<(), DomainError> {
        refused()
    }

    async fn delete_room(&self, _code: &RoomCode) -> Result<(), DomainError> {
        refused()
    }

    async fn list_players(&self, _code: &RoomCode) -> Result<Vec<Player>, DomainError> {
        refused()
    }

    async fn find_player(&self, _user_id: UserId) -> Result<Vec<Player>, DomainError> {
        refused()
    }

    async fn save_player(&self, _player: &Player) -> Result<(), DomainError> {
        refused()
    }

    async fn delete_player(&self, _code: &RoomCode, _user_id: UserId) -> Result<(), DomainError> {
        refused()
    }

    async fn list_cards(
        &self,
        _room: Option<&RoomCode>,
        _is_blitz: bool,
    ) -> Result<Vec<Card>, DomainError> {
        refused()
    }

    async fn save_cards(&self, _cards: &[Card]) -> Result<(), DomainError> {
        refused()
    }

    async fn delete_cards_for_room(&self, _code: &RoomCode) -> Result<(), DomainError> {
        refused()
    }
}
