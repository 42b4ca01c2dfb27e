//! Domain error types.

use thiserror::Error;

use crate::model::{RoomCode, UserId};

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The room is not in a status or phase that allows the operation.
    #[error("invalid room state: {0}")]
    InvalidRoomState(String),

    /// The actor is not allowed to perform the operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// No room exists with the given code.
    #[error("room not found: {0}")]
    RoomNotFound(RoomCode),

    /// The user is not seated in the room.
    #[error("player {user_id} not found in room {room_code}")]
    PlayerNotFound {
        /// The room that was searched.
        room_code: RoomCode,
        /// The missing player.
        user_id: UserId,
    },

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
