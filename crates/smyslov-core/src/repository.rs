//! Game repository abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{Card, Player, Room, RoomCode, UserId};

/// Storage of rooms, players and cards.
///
/// Implementations report storage failures as `DomainError::Infrastructure`.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Load a room by code.
    async fn get_room(&self, code: &RoomCode) -> Result<Option<Room>, DomainError>;

    /// Insert or replace a room.
    async fn save_room(&self, room: &Room) -> Result<(), DomainError>;

    /// Delete a room. Deleting a missing room is not an error.
    async fn delete_room(&self, code: &RoomCode) -> Result<(), DomainError>;

    /// List the players of a room in seat order.
    async fn list_players(&self, code: &RoomCode) -> Result<Vec<Player>, DomainError>;

    /// Find the seats a user holds across all rooms.
    async fn find_player(&self, user_id: UserId) -> Result<Vec<Player>, DomainError>;

    /// Insert or replace a player.
    async fn save_player(&self, player: &Player) -> Result<(), DomainError>;

    /// Remove a player from a room.
    async fn delete_player(&self, code: &RoomCode, user_id: UserId) -> Result<(), DomainError>;

    /// List cards of one flavor, scoped to `room` or global when `None`.
    async fn list_cards(
        &self,
        room: Option<&RoomCode>,
        is_blitz: bool,
    ) -> Result<Vec<Card>, DomainError>;

    /// Store cards.
    async fn save_cards(&self, cards: &[Card]) -> Result<(), DomainError>;

    /// Delete every card scoped to a room.
    async fn delete_cards_for_room(&self, code: &RoomCode) -> Result<(), DomainError>;
}
