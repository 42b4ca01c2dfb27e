//! Domain events for the Room & Round Orchestration context.

use serde::{Deserialize, Serialize};
use smyslov_core::event::{DomainEvent, EventMetadata};
use smyslov_core::model::{Prompt, RoundType, Standing, UserId};
use smyslov_core::notifier::ResultLine;

/// Emitted when a room is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreated {
    /// The host.
    pub host_id: UserId,
    /// The host's display name.
    pub host_name: String,
}

/// Emitted when a player takes a seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoined {
    /// The new player.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Players seated after the join.
    pub player_count: usize,
}

/// Emitted when a player changes their display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRenamed {
    /// The player.
    pub user_id: UserId,
    /// New display name.
    pub name: String,
}

/// Emitted when the host adds custom cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCardsAdded {
    /// Cards stored.
    pub added: usize,
    /// Lines skipped as malformed.
    pub rejected: usize,
    /// Whether the cards are express cards.
    pub is_blitz: bool,
}

/// Emitted when the host starts the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStarted {
    /// Players seated at start.
    pub player_count: usize,
}

/// Emitted when a round opens its answer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStarted {
    /// The round.
    pub round_number: u8,
    /// Comparison rule.
    pub round_type: RoundType,
    /// Prompt shown to players.
    pub prompt: Prompt,
}

/// Emitted when a player's answers are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersSubmitted {
    /// The player.
    pub user_id: UserId,
    /// The stored answers.
    pub answers: Vec<String>,
}

/// Emitted when a player becomes ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReady {
    /// The player.
    pub user_id: UserId,
    /// Present players that are ready.
    pub ready: usize,
    /// Present players in total.
    pub total: usize,
}

/// Emitted when a player's connection drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnected {
    /// The player.
    pub user_id: UserId,
}

/// Emitted when a player comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReconnected {
    /// The player.
    pub user_id: UserId,
    /// Whether the player's answers and readiness were discarded.
    pub answers_reset: bool,
}

/// Emitted when a round has been scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundScored {
    /// The round.
    pub round_number: u8,
    /// Per-player results in seat order.
    pub results: Vec<ResultLine>,
}

/// Emitted when the host edits a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAdjusted {
    /// The player whose score changed.
    pub user_id: UserId,
    /// Their display name.
    pub name: String,
    /// Signed change.
    pub delta: i32,
    /// Score after the change.
    pub score: i32,
}

/// Emitted when the host approves a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundApproved {
    /// The round.
    pub round_number: u8,
    /// Standings after the round.
    pub standings: Vec<Standing>,
}

/// Emitted when the last round is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFinished {
    /// Final standings, winner first.
    pub standings: Vec<Standing>,
}

/// Emitted when a player leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeft {
    /// The player.
    pub user_id: UserId,
    /// Their display name.
    pub name: String,
    /// Players remaining.
    pub player_count: usize,
}

/// Emitted when the host stops the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStopped {
    /// Who triggered the stop.
    pub stopped_by: UserId,
}

/// Event type identifier for [`RoomCreated`].
pub const ROOM_CREATED_EVENT_TYPE: &str = "room.created";

/// Event type identifier for [`PlayerJoined`].
pub const PLAYER_JOINED_EVENT_TYPE: &str = "room.player_joined";

/// Event type identifier for [`PlayerRenamed`].
pub const PLAYER_RENAMED_EVENT_TYPE: &str = "room.player_renamed";

/// Event type identifier for [`CustomCardsAdded`].
pub const CUSTOM_CARDS_ADDED_EVENT_TYPE: &str = "room.custom_cards_added";

/// Event type identifier for [`GameStarted`].
pub const GAME_STARTED_EVENT_TYPE: &str = "room.game_started";

/// Event type identifier for [`RoundStarted`].
pub const ROUND_STARTED_EVENT_TYPE: &str = "room.round_started";

/// Event type identifier for [`AnswersSubmitted`].
pub const ANSWERS_SUBMITTED_EVENT_TYPE: &str = "room.answers_submitted";

/// Event type identifier for [`PlayerReady`].
pub const PLAYER_READY_EVENT_TYPE: &str = "room.player_ready";

/// Event type identifier for [`PlayerDisconnected`].
pub const PLAYER_DISCONNECTED_EVENT_TYPE: &str = "room.player_disconnected";

/// Event type identifier for [`PlayerReconnected`].
pub const PLAYER_RECONNECTED_EVENT_TYPE: &str = "room.player_reconnected";

/// Event type identifier for [`RoundScored`].
pub const ROUND_SCORED_EVENT_TYPE: &str = "room.round_scored";

/// Event type identifier for [`ScoreAdjusted`].
pub const SCORE_ADJUSTED_EVENT_TYPE: &str = "room.score_adjusted";

/// Event type identifier for [`RoundApproved`].
pub const ROUND_APPROVED_EVENT_TYPE: &str = "room.round_approved";

/// Event type identifier for [`GameFinished`].
pub const GAME_FINISHED_EVENT_TYPE: &str = "room.game_finished";

/// Event type identifier for [`PlayerLeft`].
pub const PLAYER_LEFT_EVENT_TYPE: &str = "room.player_left";

/// Event type identifier for [`RoomStopped`].
pub const ROOM_STOPPED_EVENT_TYPE: &str = "room.stopped";

/// Event payload variants for the Room & Round Orchestration context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEventKind {
    /// A room was created.
    RoomCreated(RoomCreated),
    /// A player joined.
    PlayerJoined(PlayerJoined),
    /// A player renamed.
    PlayerRenamed(PlayerRenamed),
    /// Custom cards were added.
    CustomCardsAdded(CustomCardsAdded),
    /// The game started.
    GameStarted(GameStarted),
    /// A round opened.
    RoundStarted(RoundStarted),
    /// Answers were stored.
    AnswersSubmitted(AnswersSubmitted),
    /// A player became ready.
    PlayerReady(PlayerReady),
    /// A player disconnected.
    PlayerDisconnected(PlayerDisconnected),
    /// A player reconnected.
    PlayerReconnected(PlayerReconnected),
    /// A round was scored.
    RoundScored(RoundScored),
    /// The host edited a score.
    ScoreAdjusted(ScoreAdjusted),
    /// The host approved a round.
    RoundApproved(RoundApproved),
    /// The game finished.
    GameFinished(GameFinished),
    /// A player left.
    PlayerLeft(PlayerLeft),
    /// The host stopped the room.
    RoomStopped(RoomStopped),
}

impl RoomEventKind {
    /// Event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => ROOM_CREATED_EVENT_TYPE,
            Self::PlayerJoined(_) => PLAYER_JOINED_EVENT_TYPE,
            Self::PlayerRenamed(_) => PLAYER_RENAMED_EVENT_TYPE,
            Self::CustomCardsAdded(_) => CUSTOM_CARDS_ADDED_EVENT_TYPE,
            Self::GameStarted(_) => GAME_STARTED_EVENT_TYPE,
            Self::RoundStarted(_) => ROUND_STARTED_EVENT_TYPE,
            Self::AnswersSubmitted(_) => ANSWERS_SUBMITTED_EVENT_TYPE,
            Self::PlayerReady(_) => PLAYER_READY_EVENT_TYPE,
            Self::PlayerDisconnected(_) => PLAYER_DISCONNECTED_EVENT_TYPE,
            Self::PlayerReconnected(_) => PLAYER_RECONNECTED_EVENT_TYPE,
            Self::RoundScored(_) => ROUND_SCORED_EVENT_TYPE,
            Self::ScoreAdjusted(_) => SCORE_ADJUSTED_EVENT_TYPE,
            Self::RoundApproved(_) => ROUND_APPROVED_EVENT_TYPE,
            Self::GameFinished(_) => GAME_FINISHED_EVENT_TYPE,
            Self::PlayerLeft(_) => PLAYER_LEFT_EVENT_TYPE,
            Self::RoomStopped(_) => ROOM_STOPPED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Room & Round Orchestration context.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: RoomEventKind,
}

impl DomainEvent for RoomEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or(serde_json::Value::Null)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
