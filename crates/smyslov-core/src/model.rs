//! Room, player and card records shared by every bounded context.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of rounds in a game.
pub const TOTAL_ROUNDS: u8 = 6;

/// Characters a room code is drawn from.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Short public identifier of a room, always upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoomCode {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN || !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err(DomainError::Validation(format!("invalid room code: {raw:?}")));
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for RoomCode {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat identity of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Accepting players; the game has not started.
    Waiting,
    /// Rounds are being played.
    Playing,
    /// The game ended or was stopped.
    Finished,
}

/// Where a playing room is within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// No round is open.
    Idle,
    /// The answer window is open.
    Collecting,
    /// Results are computed and await the host's approval.
    Reviewing,
}

/// Comparison rule of a round, derived from its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    /// Answers score when anyone else wrote them too.
    Sync,
    /// Answers score when nobody else wrote them.
    Diff,
    /// Answers score when someone else wrote them at the same position.
    Express,
}

impl RoundType {
    /// Round type for a 1-based round number: 1 and 4 are `Sync`, 2 and 5
    /// are `Diff`, 3 and 6 are `Express`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `round_number` is outside `1..=6`.
    pub fn from_round(round_number: u8) -> Result<Self, DomainError> {
        match round_number {
            1 | 4 => Ok(Self::Sync),
            2 | 5 => Ok(Self::Diff),
            3 | 6 => Ok(Self::Express),
            other => Err(DomainError::Validation(format!(
                "round number out of range: {other}"
            ))),
        }
    }

    /// Whether the round draws from express ("blitz") cards.
    #[must_use]
    pub fn is_blitz(self) -> bool {
        self == Self::Express
    }

    /// Human-readable round name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sync => "Synchronisation",
            Self::Diff => "Difference",
            Self::Express => "Express",
        }
    }
}

/// Persisted room record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Public room code.
    pub code: RoomCode,
    /// The player who created the room.
    pub host_id: UserId,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Last opened round, `0` before the first round.
    pub round_number: u8,
    /// Serialized prompt of the current round.
    pub current_prompt: Option<String>,
    /// Position within the current round.
    pub round_phase: RoundPhase,
}

impl Room {
    /// Creates a waiting room hosted by `host_id`.
    #[must_use]
    pub fn new(code: RoomCode, host_id: UserId) -> Self {
        Self {
            code,
            host_id,
            status: RoomStatus::Waiting,
            round_number: 0,
            current_prompt: None,
            round_phase: RoundPhase::Idle,
        }
    }

    /// Whether `user_id` hosts this room.
    #[must_use]
    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host_id == user_id
    }
}

/// Persisted player record; belongs to exactly one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Room the player is seated in.
    pub room_code: RoomCode,
    /// Chat identity.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Running total; may be negative after host edits.
    pub score: i32,
    /// Answers of the current round.
    pub current_answers: Vec<String>,
    /// Whether the player finished the current round.
    pub is_ready: bool,
    /// Whether the player currently counts toward readiness.
    pub connected: bool,
    /// Seat order within the room, used to break ties.
    pub joined_seq: u32,
}

impl Player {
    /// Creates a fresh player with zero score.
    #[must_use]
    pub fn new(room_code: RoomCode, user_id: UserId, name: String, joined_seq: u32) -> Self {
        Self {
            room_code,
            user_id,
            name,
            score: 0,
            current_answers: Vec::new(),
            is_ready: false,
            connected: true,
            joined_seq,
        }
    }

    /// Clears per-round state.
    pub fn reset_round(&mut self) {
        self.current_answers.clear();
        self.is_ready = false;
    }
}

/// A prompt card, either global or scoped to one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card text; express cards hold `|`-separated subtopics.
    pub text: String,
    /// Whether this is an express card.
    pub is_blitz: bool,
    /// Owning room for custom cards, `None` for the global catalog.
    pub room_code: Option<RoomCode>,
}

/// Prompt shown to players during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// A single topic.
    Topic(String),
    /// Ordered subtopics answered position by position.
    Express(Vec<String>),
}

impl Prompt {
    /// Builds the prompt carried by `card`. Express subtopics keep their
    /// positions, blank ones included, since answers are compared by index.
    #[must_use]
    pub fn from_card(card: &Card) -> Self {
        if card.is_blitz {
            Self::Express(
                card.text
                    .split('|')
                    .map(|part| part.trim().to_owned())
                    .collect(),
            )
        } else {
            Self::Topic(card.text.trim().to_owned())
        }
    }

    /// Storage form, matching the card text it came from.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            Self::Topic(topic) => topic.clone(),
            Self::Express(parts) => parts.join("|"),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic(topic) => f.write_str(topic),
            Self::Express(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}. {part}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// A player's position in the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Chat identity.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Total score.
    pub score: i32,
}

/// Orders players by score, highest first; ties keep seat order.
#[must_use]
pub fn standings(players: &[Player]) -> Vec<Standing> {
    let mut seated: Vec<&Player> = players.iter().collect();
    seated.sort_by(|a, b| b.score.cmp(&a.score).then(a.joined_seq.cmp(&b.joined_seq)));
    seated
        .into_iter()
        .map(|p| Standing {
            user_id: p.user_id,
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RoomCode {
        "AB12".parse().unwrap()
    }

    #[test]
    fn test_room_code_is_case_insensitive() {
        let parsed: RoomCode = " ab12 ".parse().unwrap();

        assert_eq!(parsed.as_str(), "AB12");
    }

    #[test]
    fn test_room_code_rejects_wrong_length_and_symbols() {
        assert!("ABC".parse::<RoomCode>().is_err());
        assert!("ABCDE".parse::<RoomCode>().is_err());
        assert!("AB-1".parse::<RoomCode>().is_err());
    }

    #[test]
    fn test_round_type_cycles_through_rounds() {
        let types: Vec<RoundType> = (1..=TOTAL_ROUNDS)
            .map(|n| RoundType::from_round(n).unwrap())
            .collect();

        assert_eq!(
            types,
            vec![
                RoundType::Sync,
                RoundType::Diff,
                RoundType::Express,
                RoundType::Sync,
                RoundType::Diff,
                RoundType::Express,
            ]
        );
    }

    #[test]
    fn test_round_type_rejects_out_of_range() {
        assert!(RoundType::from_round(0).is_err());
        assert!(RoundType::from_round(7).is_err());
    }

    #[test]
    fn test_express_card_splits_into_numbered_prompt() {
        let card = Card {
            text: "Fruit | Colour|City".to_owned(),
            is_blitz: true,
            room_code: None,
        };

        let prompt = Prompt::from_card(&card);

        assert_eq!(prompt.to_string(), "1. Fruit\n2. Colour\n3. City");
        assert_eq!(prompt.to_stored(), "Fruit|Colour|City");
    }

    #[test]
    fn test_express_card_keeps_blank_positions() {
        let card = Card {
            text: "a||c|d|e|f".to_owned(),
            is_blitz: true,
            room_code: None,
        };

        let prompt = Prompt::from_card(&card);

        match &prompt {
            Prompt::Express(parts) => {
                assert_eq!(parts.len(), 6);
                assert_eq!(parts[1], "");
                assert_eq!(parts[2], "c");
            }
            other => panic!("expected Express, got {other:?}"),
        }
        assert!(prompt.to_string().ends_with("6. f"));
        assert_eq!(prompt.to_stored(), "a||c|d|e|f");
    }

    #[test]
    fn test_standings_sort_by_score_then_seat() {
        let mut a = Player::new(code(), UserId(1), "A".to_owned(), 0);
        let mut b = Player::new(code(), UserId(2), "B".to_owned(), 1);
        let mut c = Player::new(code(), UserId(3), "C".to_owned(), 2);
        a.score = 3;
        b.score = 5;
        c.score = 3;

        let names: Vec<String> = standings(&[a, b, c]).into_iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["B", "A", "C"]);
    }
}
