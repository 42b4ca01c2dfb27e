//! Outbound delivery port and the notices the engine sends.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Prompt, RoomCode, RoundType, Standing, UserId};

/// Failure to deliver a notice to one recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient cannot be reached (blocked the bot, left the chat).
    #[error("recipient {0} unreachable")]
    Unreachable(UserId),

    /// The transport rejected the message.
    #[error("transport error: {0}")]
    Transport(String),
}

/// One player's line in a round summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLine {
    /// Chat identity.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized answers, in submission order.
    pub answers: Vec<String>,
    /// Which answers earned a point.
    pub scored: Vec<bool>,
    /// Score change for the round.
    pub delta: i32,
    /// Whether the perfect-round bonus applied.
    pub bonus: bool,
    /// Total after the round.
    pub total: i32,
}

/// Messages the engine asks the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The room was created and the recipient hosts it.
    RoomCreated { room_code: RoomCode },
    /// The recipient joined a room.
    JoinedRoom { room_code: RoomCode },
    /// Sent to the host when someone joins.
    PlayerJoined { name: String, player_count: usize },
    /// Sent to the host when someone leaves.
    PlayerLeft { name: String, player_count: usize },
    /// The recipient's display name changed.
    NameChanged { name: String },
    /// Custom cards were accepted.
    CardsAdded { added: usize, rejected: usize },
    /// The host started the game.
    GameStarted { player_count: usize },
    /// A round opened.
    RoundStarted {
        round_number: u8,
        round_type: RoundType,
        prompt: Prompt,
    },
    /// The recipient's answers were stored.
    AnswersAccepted { answers: Vec<String> },
    /// The recipient is marked ready.
    ReadyAcknowledged { ready: usize, total: usize },
    /// Sent to players who are not ready shortly before the deadline.
    TimeRunningOut { seconds_left: u64 },
    /// Round summary for players.
    RoundResults {
        round_number: u8,
        results: Vec<ResultLine>,
    },
    /// Round summary for the host, with the editable standings.
    HostPanel {
        round_number: u8,
        results: Vec<ResultLine>,
        standings: Vec<Standing>,
    },
    /// The host changed a score.
    ScoreAdjusted {
        name: String,
        delta: i32,
        score: i32,
    },
    /// The host approved a round.
    RoundApproved {
        round_number: u8,
        standings: Vec<Standing>,
    },
    /// Final standings.
    GameOver { standings: Vec<Standing> },
    /// The host stopped the room.
    RoomStopped,
}

fn write_standings(f: &mut fmt::Formatter<'_>, standings: &[Standing]) -> fmt::Result {
    for (i, standing) in standings.iter().enumerate() {
        write!(f, "\n{}. {} ({})", i + 1, standing.name, standing.score)?;
    }
    Ok(())
}

fn write_results(f: &mut fmt::Formatter<'_>, results: &[ResultLine]) -> fmt::Result {
    for line in results {
        let marked: Vec<String> = line
            .answers
            .iter()
            .zip(&line.scored)
            .map(|(answer, &scored)| {
                if scored {
                    format!("{answer} +")
                } else {
                    answer.clone()
                }
            })
            .collect();
        write!(
            f,
            "\n{}: {:+} -> {}",
            line.name, line.delta, line.total
        )?;
        if line.bonus {
            f.write_str(" (bonus)")?;
        }
        if !marked.is_empty() {
            write!(f, "\n  {}", marked.join(", "))?;
        }
    }
    Ok(())
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomCreated { room_code } => {
                write!(f, "Room {room_code} created. Share the code with your friends.")
            }
            Self::JoinedRoom { room_code } => write!(f, "You joined room {room_code}."),
            Self::PlayerJoined { name, player_count } => {
                write!(f, "{name} joined. Players: {player_count}")
            }
            Self::PlayerLeft { name, player_count } => {
                write!(f, "{name} left. Players: {player_count}")
            }
            Self::NameChanged { name } => write!(f, "Your name is now {name}."),
            Self::CardsAdded { added, rejected } => {
                write!(f, "Cards added: {added}")?;
                if *rejected > 0 {
                    write!(f, ", skipped: {rejected}")?;
                }
                Ok(())
            }
            Self::GameStarted { player_count } => {
                write!(f, "The game starts with {player_count} players!")
            }
            Self::RoundStarted {
                round_number,
                round_type,
                prompt,
            } => write!(
                f,
                "Round {round_number}: {}\n{prompt}",
                round_type.name()
            ),
            Self::AnswersAccepted { answers } => {
                write!(f, "Answers saved: {}", answers.join(", "))
            }
            Self::ReadyAcknowledged { ready, total } => write!(f, "Ready {ready}/{total}"),
            Self::TimeRunningOut { seconds_left } => {
                write!(f, "{seconds_left} seconds left!")
            }
            Self::RoundResults {
                round_number,
                results,
            } => {
                write!(f, "Round {round_number} results:")?;
                write_results(f, results)
            }
            Self::HostPanel {
                round_number,
                results,
                standings,
            } => {
                write!(f, "Round {round_number} results:")?;
                write_results(f, results)?;
                f.write_str("\nStandings:")?;
                write_standings(f, standings)
            }
            Self::ScoreAdjusted { name, delta, score } => {
                write!(f, "{name}: {delta:+} -> {score}")
            }
            Self::RoundApproved {
                round_number,
                standings,
            } => {
                write!(f, "Round {round_number} approved.")?;
                write_standings(f, standings)
            }
            Self::GameOver { standings } => {
                f.write_str("Game over!")?;
                write_standings(f, standings)?;
                if let Some(winner) = standings.first() {
                    write!(f, "\nWinner: {}", winner.name)?;
                }
                Ok(())
            }
            Self::RoomStopped => f.write_str("The host stopped the game."),
        }
    }
}

/// Port through which the engine reaches players.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notice to one user.
    async fn notify_player(&self, user_id: UserId, notice: &Notice) -> Result<(), DeliveryError>;

    /// Deliver a notice to every member of a room except `exclude`.
    async fn notify_room(
        &self,
        room_code: &RoomCode,
        notice: &Notice,
        exclude: Option<UserId>,
    ) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_started_renders_numbered_express_prompt() {
        let notice = Notice::RoundStarted {
            round_number: 3,
            round_type: RoundType::Express,
            prompt: Prompt::Express(vec!["Fruit".to_owned(), "City".to_owned()]),
        };

        assert_eq!(notice.to_string(), "Round 3: Express\n1. Fruit\n2. City");
    }

    #[test]
    fn test_game_over_names_first_standing_as_winner() {
        let notice = Notice::GameOver {
            standings: vec![
                Standing {
                    user_id: UserId(2),
                    name: "Bo".to_owned(),
                    score: 9,
                },
                Standing {
                    user_id: UserId(1),
                    name: "Al".to_owned(),
                    score: 4,
                },
            ],
        };

        let text = notice.to_string();

        assert!(text.ends_with("Winner: Bo"), "got {text}");
    }
}
