//! Commands for the Room & Round Orchestration context.

use smyslov_core::command::Command;
use smyslov_core::model::{RoomCode, UserId};
use uuid::Uuid;

/// Command to create a room hosted by the sender.
#[derive(Debug, Clone)]
pub struct CreateRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The creator, who becomes host.
    pub user_id: UserId,
    /// The creator's display name.
    pub name: String,
}

impl Command for CreateRoom {
    fn command_type(&self) -> &'static str {
        "room.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to take a seat in a waiting room.
#[derive(Debug, Clone)]
pub struct JoinRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The joining user.
    pub user_id: UserId,
    /// The joining user's display name.
    pub name: String,
}

impl Command for JoinRoom {
    fn command_type(&self) -> &'static str {
        "room.join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command to change a player's display name.
#[derive(Debug, Clone)]
pub struct RenamePlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The player.
    pub user_id: UserId,
    /// The requested name.
    pub name: String,
}

impl Command for RenamePlayer {
    fn command_type(&self) -> &'static str {
        "room.rename_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for the host to add room-scoped cards.
#[derive(Debug, Clone)]
pub struct AddCustomCards {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The acting user.
    pub user_id: UserId,
    /// The message holding the cards.
    pub raw: String,
    /// Whether the message holds express cards.
    pub express: bool,
}

impl Command for AddCustomCards {
    fn command_type(&self) -> &'static str {
        "room.add_custom_cards"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for the host to start the game.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The acting user.
    pub user_id: UserId,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "room.start_game"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command to store a player's answers for the open round.
#[derive(Debug, Clone)]
pub struct SubmitAnswers {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The player.
    pub user_id: UserId,
    /// The answer message.
    pub raw: String,
}

impl Command for SubmitAnswers {
    fn command_type(&self) -> &'static str {
        "room.submit_answers"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command to mark a player ready.
#[derive(Debug, Clone)]
pub struct MarkReady {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The player.
    pub user_id: UserId,
}

impl Command for MarkReady {
    fn command_type(&self) -> &'static str {
        "room.mark_ready"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for the host to change a player's score.
#[derive(Debug, Clone)]
pub struct AdjustScore {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The acting user.
    pub user_id: UserId,
    /// The player whose score changes.
    pub target: UserId,
    /// Signed change.
    pub delta: i32,
}

impl Command for AdjustScore {
    fn command_type(&self) -> &'static str {
        "room.adjust_score"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for the host to approve the reviewed round.
#[derive(Debug, Clone)]
pub struct AdvanceRound {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The acting user.
    pub user_id: UserId,
}

impl Command for AdvanceRound {
    fn command_type(&self) -> &'static str {
        "room.advance_round"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for the host to stop the room.
#[derive(Debug, Clone)]
pub struct StopGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The acting user.
    pub user_id: UserId,
}

impl Command for StopGame {
    fn command_type(&self) -> &'static str {
        "room.stop_game"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command for a player to leave.
#[derive(Debug, Clone)]
pub struct LeaveRoom {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The leaving player.
    pub user_id: UserId,
}

impl Command for LeaveRoom {
    fn command_type(&self) -> &'static str {
        "room.leave"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command recording that a player's connection dropped.
#[derive(Debug, Clone)]
pub struct DisconnectPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The player.
    pub user_id: UserId,
}

impl Command for DisconnectPlayer {
    fn command_type(&self) -> &'static str {
        "room.disconnect_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}

/// Command recording that a player came back.
#[derive(Debug, Clone)]
pub struct ReconnectPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target room.
    pub room_code: RoomCode,
    /// The player.
    pub user_id: UserId,
}

impl Command for ReconnectPlayer {
    fn command_type(&self) -> &'static str {
        "room.reconnect_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn room_code(&self) -> Option<&RoomCode> {
        Some(&self.room_code)
    }
}
