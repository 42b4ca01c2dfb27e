//! Aggregate root for the Room & Round Orchestration context.

use std::collections::BTreeMap;

use smyslov_core::aggregate::AggregateRoot;
use smyslov_core::clock::Clock;
use smyslov_core::error::DomainError;
use smyslov_core::event::EventMetadata;
use smyslov_core::model::{
    Player, Prompt, Room, RoomCode, RoomStatus, RoundPhase, RoundType, Standing, TOTAL_ROUNDS,
    UserId, standings,
};
use smyslov_core::notifier::ResultLine;
use smyslov_scoring::domain::scoring::PlayerScore;
use uuid::Uuid;

use super::events::{
    AnswersSubmitted, CustomCardsAdded, GameFinished, GameStarted, PlayerDisconnected,
    PlayerJoined, PlayerLeft, PlayerReady, PlayerReconnected, PlayerRenamed, RoomCreated,
    RoomEvent, RoomEventKind, RoomStopped, RoundApproved, RoundScored, RoundStarted,
    ScoreAdjusted,
};

/// What happened when a player left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player left; the room continues.
    Left {
        /// Players remaining.
        remaining: usize,
    },
    /// The host left an unfinished room, which stops it.
    Stopped,
}

/// Trims a requested display name and caps it at `max_len` characters.
///
/// # Errors
///
/// Returns `DomainError::Validation` if nothing is left after trimming.
pub fn display_name(raw: &str, max_len: usize) -> Result<String, DomainError> {
    let name: String = raw.trim().chars().take(max_len).collect();
    let name = name.trim_end().to_owned();
    if name.is_empty() {
        return Err(DomainError::Validation("display name is empty".to_owned()));
    }
    Ok(name)
}

/// The aggregate root for a room: the room record plus its seated players.
#[derive(Debug)]
pub struct RoomSession {
    /// The room record.
    pub room: Room,
    /// Seated players in seat order.
    pub players: Vec<Player>,
    /// Uncommitted events pending publication.
    uncommitted_events: Vec<RoomEvent>,
}

impl RoomSession {
    /// Rebuilds the aggregate from stored state.
    #[must_use]
    pub fn from_parts(room: Room, mut players: Vec<Player>) -> Self {
        players.sort_by_key(|p| p.joined_seq);
        Self {
            room,
            players,
            uncommitted_events: Vec::new(),
        }
    }

    /// Creates a waiting room with its host as the first player.
    #[must_use]
    pub fn create(
        code: RoomCode,
        host_id: UserId,
        host_name: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Self {
        let host = Player::new(code.clone(), host_id, host_name.clone(), 0);
        let mut session = Self::from_parts(Room::new(code, host_id), vec![host]);
        session.record(
            RoomEventKind::RoomCreated(RoomCreated { host_id, host_name }),
            correlation_id,
            clock,
        );
        session
    }

    fn record(&mut self, kind: RoomEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        self.uncommitted_events.push(RoomEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                room_code: self.room.code.clone(),
                round_number: self.room.round_number,
                correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        });
    }

    fn require_host(&self, actor: UserId, action: &str) -> Result<(), DomainError> {
        if self.room.is_host(actor) {
            Ok(())
        } else {
            Err(DomainError::NotAuthorized(format!(
                "only the host can {action}"
            )))
        }
    }

    fn require_status(&self, status: RoomStatus) -> Result<(), DomainError> {
        if self.room.status == status {
            Ok(())
        } else {
            Err(DomainError::InvalidRoomState(format!(
                "room {} is {:?}, expected {status:?}",
                self.room.code, self.room.status
            )))
        }
    }

    fn require_phase(&self, phase: RoundPhase) -> Result<(), DomainError> {
        self.require_status(RoomStatus::Playing)?;
        if self.room.round_phase == phase {
            Ok(())
        } else {
            Err(DomainError::InvalidRoomState(format!(
                "round {} is {:?}, expected {phase:?}",
                self.room.round_number, self.room.round_phase
            )))
        }
    }

    fn player_index(&self, user_id: UserId) -> Result<usize, DomainError> {
        self.players
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or_else(|| DomainError::PlayerNotFound {
                room_code: self.room.code.clone(),
                user_id,
            })
    }

    /// Returns the seated player for `user_id`, if any.
    #[must_use]
    pub fn player(&self, user_id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    /// How many connected players are ready, and how many are connected.
    #[must_use]
    pub fn readiness(&self) -> (usize, usize) {
        let total = self.players.iter().filter(|p| p.connected).count();
        let ready = self
            .players
            .iter()
            .filter(|p| p.connected && p.is_ready)
            .count();
        (ready, total)
    }

    /// Whether every connected player is ready. False when nobody is
    /// connected, so an empty table waits for the deadline.
    #[must_use]
    pub fn all_present_ready(&self) -> bool {
        let (ready, total) = self.readiness();
        total > 0 && ready == total
    }

    /// Current standings, highest score first.
    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        standings(&self.players)
    }

    /// Seats a new player.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` if the room is not waiting or
    /// the user is already seated.
    pub fn join(
        &mut self,
        user_id: UserId,
        name: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_status(RoomStatus::Waiting)?;
        if self.player(user_id).is_some() {
            return Err(DomainError::InvalidRoomState(format!(
                "user {user_id} is already in room {}",
                self.room.code
            )));
        }
        let seq = self
            .players
            .iter()
            .map(|p| p.joined_seq + 1)
            .max()
            .unwrap_or(0);
        self.players
            .push(Player::new(self.room.code.clone(), user_id, name.clone(), seq));
        let player_count = self.players.len();
        self.record(
            RoomEventKind::PlayerJoined(PlayerJoined {
                user_id,
                name,
                player_count,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Changes a player's display name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` if the user is not seated.
    pub fn rename(
        &mut self,
        user_id: UserId,
        name: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let index = self.player_index(user_id)?;
        self.players[index].name.clone_from(&name);
        self.record(
            RoomEventKind::PlayerRenamed(PlayerRenamed { user_id, name }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records custom cards added by the host.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAuthorized` for non-hosts and
    /// `DomainError::InvalidRoomState` once the game started.
    pub fn add_custom_cards(
        &mut self,
        actor: UserId,
        added: usize,
        rejected: usize,
        is_blitz: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_host(actor, "add cards")?;
        self.require_status(RoomStatus::Waiting)?;
        self.record(
            RoomEventKind::CustomCardsAdded(CustomCardsAdded {
                added,
                rejected,
                is_blitz,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Starts the game: `waiting → playing`, round counter reset to zero.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAuthorized` for non-hosts and
    /// `DomainError::InvalidRoomState` if the room is not waiting.
    pub fn start(
        &mut self,
        actor: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_host(actor, "start the game")?;
        self.require_status(RoomStatus::Waiting)?;
        self.room.status = RoomStatus::Playing;
        self.room.round_number = 0;
        self.room.round_phase = RoundPhase::Idle;
        let player_count = self.players.len();
        self.record(
            RoomEventKind::GameStarted(GameStarted { player_count }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Type of the round that would open next.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` unless the room is playing,
    /// between rounds, and has rounds left.
    pub fn next_round_type(&self) -> Result<RoundType, DomainError> {
        self.require_phase(RoundPhase::Idle)?;
        if self.room.round_number >= TOTAL_ROUNDS {
            return Err(DomainError::InvalidRoomState(format!(
                "room {} already played {TOTAL_ROUNDS} rounds",
                self.room.code
            )));
        }
        RoundType::from_round(self.room.round_number + 1)
    }

    /// Opens the next round with `prompt`, clearing every player's answers
    /// and readiness. Returns the new round number.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` if no round can open now.
    pub fn open_round(
        &mut self,
        prompt: Prompt,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<u8, DomainError> {
        let round_type = self.next_round_type()?;
        self.room.round_number += 1;
        self.room.current_prompt = Some(prompt.to_stored());
        self.room.round_phase = RoundPhase::Collecting;
        for player in &mut self.players {
            player.reset_round();
        }
        let round_number = self.room.round_number;
        self.record(
            RoomEventKind::RoundStarted(RoundStarted {
                round_number,
                round_type,
                prompt,
            }),
            correlation_id,
            clock,
        );
        Ok(round_number)
    }

    /// Replaces a player's answers for the open round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` outside the answer window or
    /// once the player is ready, `DomainError::PlayerNotFound` if the user is
    /// not seated, and `DomainError::Validation` for an empty submission.
    pub fn submit_answers(
        &mut self,
        user_id: UserId,
        answers: Vec<String>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_phase(RoundPhase::Collecting)?;
        let index = self.player_index(user_id)?;
        if answers.is_empty() {
            return Err(DomainError::Validation("no answers given".to_owned()));
        }
        let player = &mut self.players[index];
        if player.is_ready {
            return Err(DomainError::InvalidRoomState(format!(
                "player {user_id} is already ready"
            )));
        }
        player.current_answers.clone_from(&answers);
        self.record(
            RoomEventKind::AnswersSubmitted(AnswersSubmitted { user_id, answers }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Marks a player ready. Returns `false` if they already were.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` outside the answer window and
    /// `DomainError::PlayerNotFound` if the user is not seated.
    pub fn mark_ready(
        &mut self,
        user_id: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.require_phase(RoundPhase::Collecting)?;
        let index = self.player_index(user_id)?;
        if self.players[index].is_ready {
            return Ok(false);
        }
        self.players[index].is_ready = true;
        let (ready, total) = self.readiness();
        self.record(
            RoomEventKind::PlayerReady(PlayerReady {
                user_id,
                ready,
                total,
            }),
            correlation_id,
            clock,
        );
        Ok(true)
    }

    /// Marks a player as disconnected; they stop counting toward readiness.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` if the user is not seated.
    pub fn disconnect(
        &mut self,
        user_id: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let index = self.player_index(user_id)?;
        if !self.players[index].connected {
            return Ok(());
        }
        self.players[index].connected = false;
        self.record(
            RoomEventKind::PlayerDisconnected(PlayerDisconnected { user_id }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Marks a player as connected again. With `reset_answers`, answers and
    /// readiness for an open round are discarded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` if the user is not seated.
    pub fn reconnect(
        &mut self,
        user_id: UserId,
        reset_answers: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let index = self.player_index(user_id)?;
        if self.players[index].connected {
            return Ok(());
        }
        let answers_reset = reset_answers && self.room.round_phase == RoundPhase::Collecting;
        let player = &mut self.players[index];
        player.connected = true;
        if answers_reset {
            player.reset_round();
        }
        self.record(
            RoomEventKind::PlayerReconnected(PlayerReconnected {
                user_id,
                answers_reset,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Answers of every seated player for the open round.
    #[must_use]
    pub fn submissions(&self) -> BTreeMap<UserId, Vec<String>> {
        self.players
            .iter()
            .map(|p| (p.user_id, p.current_answers.clone()))
            .collect()
    }

    /// Applies computed scores and moves the round to review. Returns the
    /// per-player result lines in seat order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRoomState` unless answers are being
    /// collected.
    pub fn record_scores(
        &mut self,
        scores: &BTreeMap<UserId, PlayerScore>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Vec<ResultLine>, DomainError> {
        self.require_phase(RoundPhase::Collecting)?;
        let mut results = Vec::with_capacity(self.players.len());
        for player in &mut self.players {
            let Some(score) = scores.get(&player.user_id) else {
                continue;
            };
            player.score = player.score.saturating_add(score.delta());
            results.push(ResultLine {
                user_id: player.user_id,
                name: player.name.clone(),
                answers: score.answers.clone(),
                scored: score.scored.clone(),
                delta: score.delta(),
                bonus: score.bonus,
                total: player.score,
            });
        }
        self.room.round_phase = RoundPhase::Reviewing;
        let round_number = self.room.round_number;
        self.record(
            RoomEventKind::RoundScored(RoundScored {
                round_number,
                results: results.clone(),
            }),
            correlation_id,
            clock,
        );
        Ok(results)
    }

    /// Host edit of a player's score during review.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAuthorized` for non-hosts,
    /// `DomainError::InvalidRoomState` outside review and
    /// `DomainError::PlayerNotFound` for an unknown target.
    pub fn adjust_score(
        &mut self,
        actor: UserId,
        target: UserId,
        delta: i32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_host(actor, "adjust scores")?;
        self.require_phase(RoundPhase::Reviewing)?;
        let index = self.player_index(target)?;
        let player = &mut self.players[index];
        player.score = player.score.saturating_add(delta);
        let event = ScoreAdjusted {
            user_id: target,
            name: player.name.clone(),
            delta,
            score: player.score,
        };
        self.record(RoomEventKind::ScoreAdjusted(event), correlation_id, clock);
        Ok(())
    }

    /// Host approval of the reviewed round. Returns `true` when that was the
    /// last round and the room is now finished.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAuthorized` for non-hosts and
    /// `DomainError::InvalidRoomState` outside review.
    pub fn approve_round(
        &mut self,
        actor: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<bool, DomainError> {
        self.require_host(actor, "advance the game")?;
        self.require_phase(RoundPhase::Reviewing)?;
        self.room.round_phase = RoundPhase::Idle;
        let standings = self.standings();
        self.record(
            RoomEventKind::RoundApproved(RoundApproved {
                round_number: self.room.round_number,
                standings: standings.clone(),
            }),
            correlation_id,
            clock,
        );
        if self.room.round_number < TOTAL_ROUNDS {
            return Ok(false);
        }
        self.room.status = RoomStatus::Finished;
        self.room.current_prompt = None;
        self.record(
            RoomEventKind::GameFinished(GameFinished { standings }),
            correlation_id,
            clock,
        );
        Ok(true)
    }

    /// Host stop: the room finishes immediately.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAuthorized` for non-hosts and
    /// `DomainError::InvalidRoomState` if the room already finished.
    pub fn stop(
        &mut self,
        actor: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_host(actor, "stop the game")?;
        if self.room.status == RoomStatus::Finished {
            return Err(DomainError::InvalidRoomState(format!(
                "room {} already finished",
                self.room.code
            )));
        }
        self.room.status = RoomStatus::Finished;
        self.room.round_phase = RoundPhase::Idle;
        self.record(
            RoomEventKind::RoomStopped(RoomStopped { stopped_by: actor }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Removes a player. The host leaving an unfinished room stops it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` if the user is not seated.
    pub fn leave(
        &mut self,
        user_id: UserId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<LeaveOutcome, DomainError> {
        let index = self.player_index(user_id)?;
        if self.room.is_host(user_id) && self.room.status != RoomStatus::Finished {
            self.stop(user_id, correlation_id, clock)?;
            return Ok(LeaveOutcome::Stopped);
        }
        let player = self.players.remove(index);
        let remaining = self.players.len();
        self.record(
            RoomEventKind::PlayerLeft(PlayerLeft {
                user_id,
                name: player.name,
                player_count: remaining,
            }),
            correlation_id,
            clock,
        );
        Ok(LeaveOutcome::Left { remaining })
    }
}

impl AggregateRoot for RoomSession {
    type Event = RoomEvent;

    fn aggregate_id(&self) -> &RoomCode {
        &self.room.code
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted_events)
    }
}
