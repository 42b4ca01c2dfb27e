//! Query handlers for the Room & Round Orchestration context.
//!
//! Read-only views over stored room state. Other players' answers are never
//! exposed while a round is open; a view only says whether someone answered.

use serde::Serialize;
use smyslov_core::error::DomainError;
use smyslov_core::model::{RoomCode, RoomStatus, RoundPhase, RoundType, Standing, UserId};
use smyslov_core::repository::GameRepository;

use crate::application::command_handlers::load_session;

/// Read-only view of one seated player.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// Chat identity.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Total score.
    pub score: i32,
    /// Whether answers were submitted this round.
    pub answered: bool,
    /// Whether the player is ready this round.
    pub is_ready: bool,
    /// Whether the player counts toward readiness.
    pub connected: bool,
}

/// Read-only view of a room.
#[derive(Debug, Serialize)]
pub struct RoomView {
    /// Public room code.
    pub room_code: RoomCode,
    /// The host.
    pub host_id: UserId,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Last opened round.
    pub round_number: u8,
    /// Type of the last opened round.
    pub round_type: Option<RoundType>,
    /// Position within the round.
    pub round_phase: RoundPhase,
    /// Prompt of the last opened round.
    pub current_prompt: Option<String>,
    /// Seated players in seat order.
    pub players: Vec<PlayerView>,
}

/// Retrieves a room overview by code.
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` for an unknown code and
/// `DomainError::Infrastructure` if storage fails.
pub async fn get_room_by_code(
    code: &RoomCode,
    repo: &dyn GameRepository,
) -> Result<RoomView, DomainError> {
    let session = load_session(repo, code).await?;
    let room = session.room;
    Ok(RoomView {
        round_type: RoundType::from_round(room.round_number).ok(),
        room_code: room.code,
        host_id: room.host_id,
        status: room.status,
        round_number: room.round_number,
        round_phase: room.round_phase,
        current_prompt: room.current_prompt,
        players: session
            .players
            .into_iter()
            .map(|p| PlayerView {
                user_id: p.user_id,
                name: p.name,
                score: p.score,
                answered: !p.current_answers.is_empty(),
                is_ready: p.is_ready,
                connected: p.connected,
            })
            .collect(),
    })
}

/// Retrieves the standings of a room, highest score first.
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` for an unknown code and
/// `DomainError::Infrastructure` if storage fails.
pub async fn get_standings(
    code: &RoomCode,
    repo: &dyn GameRepository,
) -> Result<Vec<Standing>, DomainError> {
    Ok(load_session(repo, code).await?.standings())
}

#[cfg(test)]
mod tests {
    use smyslov_core::error::DomainError;
    use smyslov_core::model::{Player, Room, RoomCode, RoomStatus, RoundType, UserId};
    use smyslov_core::repository::GameRepository;
    use smyslov_test_support::{FailingRepository, InMemoryRepository};

    use super::{get_room_by_code, get_standings};

    fn code() -> RoomCode {
        "AB12".parse().unwrap()
    }

    async fn seeded_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let mut room = Room::new(code(), UserId(1));
        room.status = RoomStatus::Playing;
        room.round_number = 2;
        repo.save_room(&room).await.unwrap();
        let mut host = Player::new(code(), UserId(1), "Host".to_owned(), 0);
        host.score = 1;
        let mut guest = Player::new(code(), UserId(2), "Guest".to_owned(), 1);
        guest.score = 4;
        guest.current_answers = vec!["secret".to_owned()];
        repo.save_player(&host).await.unwrap();
        repo.save_player(&guest).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_get_room_by_code_hides_answers() {
        // Arrange
        let repo = seeded_repo().await;

        // Act
        let view = get_room_by_code(&code(), &repo).await.unwrap();

        // Assert
        assert_eq!(view.round_type, Some(RoundType::Diff));
        assert_eq!(view.players.len(), 2);
        assert!(view.players[1].answered);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));
    }

    #[tokio::test]
    async fn test_get_standings_sorts_by_score() {
        let repo = seeded_repo().await;

        let standings = get_standings(&code(), &repo).await.unwrap();

        assert_eq!(standings[0].name, "Guest");
        assert_eq!(standings[1].name, "Host");
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let repo = InMemoryRepository::new();

        let result = get_room_by_code(&code(), &repo).await;

        match result {
            Err(DomainError::RoomNotFound(missing)) => assert_eq!(missing, code()),
            other => panic!("expected RoomNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_infrastructure() {
        let result = get_standings(&code(), &FailingRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
