//! Command handlers for the Room & Round Orchestration context.
//!
//! Each handler takes the room lock, loads the aggregate, executes the
//! command, persists the new state and publishes the recorded events.
//! Handlers that open a round return its task handle.

use smyslov_core::aggregate::AggregateRoot;
use smyslov_core::command::Command;
use smyslov_core::error::DomainError;
use smyslov_core::model::{
    ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode, RoomStatus, RoundPhase, UserId,
};
use smyslov_core::repository::GameRepository;
use smyslov_scoring::domain::answers::{MAX_ANSWERS, parse_answers};
use smyslov_scoring::domain::cards::{parse_express_cards, parse_standard_cards};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument};

use super::barrier::RoundSignal;
use super::context::EngineContext;
use super::publisher::publish;
use super::round_coordinator::{RoundTask, spawn_round};
use crate::config::RejoinPolicy;
use crate::domain::aggregates::{LeaveOutcome, RoomSession, display_name};
use crate::domain::commands::{
    AddCustomCards, AdjustScore, AdvanceRound, CreateRoom, DisconnectPlayer, JoinRoom, LeaveRoom,
    MarkReady, ReconnectPlayer, RenamePlayer, StartGame, StopGame, SubmitAnswers,
};
use crate::domain::events::RoomEvent;

const ROOM_CODE_ATTEMPTS: usize = 32;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct RoomCommandResult {
    /// The room affected or created by the command.
    pub room_code: RoomCode,
    /// The events produced and published.
    pub events: Vec<RoomEvent>,
    /// The round started by the command, if any.
    pub round_task: Option<RoundTask>,
}

impl RoomCommandResult {
    fn new(room_code: RoomCode, events: Vec<RoomEvent>) -> Self {
        Self {
            room_code,
            events,
            round_task: None,
        }
    }
}

/// Loads a room and its players, or `None` if the room does not exist.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if storage fails.
pub(crate) async fn find_session(
    repo: &dyn GameRepository,
    code: &RoomCode,
) -> Result<Option<RoomSession>, DomainError> {
    let Some(room) = repo.get_room(code).await? else {
        return Ok(None);
    };
    let players = repo.list_players(code).await?;
    Ok(Some(RoomSession::from_parts(room, players)))
}

/// Loads a room and its players.
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` if the room does not exist and
/// `DomainError::Infrastructure` if storage fails.
pub(crate) async fn load_session(
    repo: &dyn GameRepository,
    code: &RoomCode,
) -> Result<RoomSession, DomainError> {
    find_session(repo, code)
        .await?
        .ok_or_else(|| DomainError::RoomNotFound(code.clone()))
}

/// Saves the room record and every seated player.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if storage fails.
pub(crate) async fn persist(
    repo: &dyn GameRepository,
    session: &RoomSession,
) -> Result<(), DomainError> {
    repo.save_room(&session.room).await?;
    for player in &session.players {
        repo.save_player(player).await?;
    }
    Ok(())
}

async fn commit(ctx: &EngineContext, session: &mut RoomSession) -> Result<Vec<RoomEvent>, DomainError> {
    persist(ctx.repo.as_ref(), session).await?;
    let events = session.take_uncommitted_events();
    publish(ctx.notifier.as_ref(), session, &events).await;
    Ok(events)
}

/// Publishes the final events of a room, then deletes its cards, players and
/// record.
async fn close_room(
    ctx: &EngineContext,
    session: &mut RoomSession,
    guard: OwnedMutexGuard<()>,
) -> Result<Vec<RoomEvent>, DomainError> {
    let code = session.room.code.clone();
    let events = session.take_uncommitted_events();
    publish(ctx.notifier.as_ref(), session, &events).await;

    ctx.repo.delete_cards_for_room(&code).await?;
    for player in ctx.repo.list_players(&code).await? {
        ctx.repo.delete_player(&code, player.user_id).await?;
    }
    ctx.repo.delete_room(&code).await?;
    drop(guard);
    ctx.locks.forget(&code);
    info!(room_code = %code, "room closed");
    Ok(events)
}

/// Rejects submissions and readiness once the answer window closed, even
/// before the coordinator moved the room to review.
fn ensure_window_open(ctx: &EngineContext, session: &RoomSession) -> Result<(), DomainError> {
    if session.room.round_phase == RoundPhase::Collecting && !ctx.is_collecting(&session.room.code) {
        return Err(DomainError::InvalidRoomState(format!(
            "answer window of round {} is closed",
            session.room.round_number
        )));
    }
    Ok(())
}

fn release_if_all_ready(ctx: &EngineContext, session: &RoomSession) {
    if session.room.round_phase == RoundPhase::Collecting
        && session.all_present_ready()
        && ctx.rounds.release(&session.room.code, RoundSignal::AllReady)
    {
        info!(room_code = %session.room.code, "all present players ready");
    }
}

/// Fails if `user_id` sits in an unfinished room other than `except`.
async fn ensure_not_seated(
    ctx: &EngineContext,
    user_id: UserId,
    except: Option<&RoomCode>,
) -> Result<(), DomainError> {
    for seat in ctx.repo.find_player(user_id).await? {
        if Some(&seat.room_code) == except {
            continue;
        }
        if let Some(room) = ctx.repo.get_room(&seat.room_code).await?
            && room.status != RoomStatus::Finished
        {
            return Err(DomainError::InvalidRoomState(format!(
                "user {user_id} is already in room {}",
                room.code
            )));
        }
    }
    Ok(())
}

fn draw_room_code(ctx: &EngineContext) -> Result<RoomCode, DomainError> {
    // Lock RNG only for the synchronous draw, never across an await.
    let mut rng = ctx
        .rng
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.pick_index(ROOM_CODE_ALPHABET.len())]))
        .collect();
    code.parse()
}

/// Draws codes until one is free, returning it locked.
async fn allocate_room_code(
    ctx: &EngineContext,
) -> Result<(RoomCode, OwnedMutexGuard<()>), DomainError> {
    for _ in 0..ROOM_CODE_ATTEMPTS {
        let code = draw_room_code(ctx)?;
        let guard = ctx.locks.acquire(&code).await;
        if ctx.repo.get_room(&code).await?.is_none() {
            return Ok((code, guard));
        }
        debug!(room_code = %code, "room code taken, drawing again");
    }
    Err(DomainError::Infrastructure(
        "no free room code available".to_owned(),
    ))
}

/// Handles the `CreateRoom` command: allocates a fresh code and seats the
/// creator as host.
///
/// # Errors
///
/// Returns `DomainError::InvalidRoomState` if the creator already sits in an
/// unfinished room, `DomainError::Validation` for an empty name, and
/// `DomainError::Infrastructure` if storage fails.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        user_id = %command.user_id
    )
)]
pub async fn handle_create_room(
    command: &CreateRoom,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    ensure_not_seated(ctx, command.user_id, None).await?;
    let name = display_name(&command.name, ctx.settings.max_name_len)?;

    let (code, _guard) = allocate_room_code(ctx).await?;
    let mut session = RoomSession::create(
        code.clone(),
        command.user_id,
        name,
        command.correlation_id,
        ctx.clock.as_ref(),
    );
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(code, events))
}

/// Handles the `JoinRoom` command.
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` for an unknown code,
/// `DomainError::InvalidRoomState` if the room is not waiting or the user is
/// already seated (here or elsewhere), and `DomainError::Validation` for an
/// empty name.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_join_room(
    command: &JoinRoom,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    ensure_not_seated(ctx, command.user_id, Some(&command.room_code)).await?;
    let name = display_name(&command.name, ctx.settings.max_name_len)?;

    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.join(command.user_id, name, command.correlation_id, ctx.clock.as_ref())?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `RenamePlayer` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty name and
/// `DomainError::RoomNotFound` / `DomainError::PlayerNotFound` if the seat
/// does not exist.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_rename_player(
    command: &RenamePlayer,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let name = display_name(&command.name, ctx.settings.max_name_len)?;

    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.rename(command.user_id, name, command.correlation_id, ctx.clock.as_ref())?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `AddCustomCards` command: parses the message and stores the
/// cards for this room only.
///
/// # Errors
///
/// Returns `DomainError::NotAuthorized` for non-hosts,
/// `DomainError::InvalidRoomState` once the game started and
/// `DomainError::Validation` if the message holds no usable card.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_add_custom_cards(
    command: &AddCustomCards,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let parsed = if command.express {
        parse_express_cards(&command.raw)
    } else {
        parse_standard_cards(&command.raw)
    };

    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.add_custom_cards(
        command.user_id,
        parsed.texts.len(),
        parsed.rejected,
        command.express,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    if parsed.texts.is_empty() {
        return Err(DomainError::Validation("no cards found in message".to_owned()));
    }

    let cards = parsed.into_cards(&command.room_code, command.express);
    ctx.repo.save_cards(&cards).await?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `StartGame` command and spawns the first round.
///
/// # Errors
///
/// Returns `DomainError::NotAuthorized` for non-hosts and
/// `DomainError::InvalidRoomState` if the room is not waiting.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_start_game(
    command: &StartGame,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.start(command.user_id, command.correlation_id, ctx.clock.as_ref())?;
    let events = commit(ctx, &mut session).await?;
    drop(guard);

    let round_task = spawn_round(ctx, command.room_code.clone(), command.correlation_id);
    Ok(RoomCommandResult {
        room_code: command.room_code.clone(),
        events,
        round_task: Some(round_task),
    })
}

/// Handles the `SubmitAnswers` command. The message is split into at most six
/// answers; a new submission replaces the previous one.
///
/// # Errors
///
/// Returns `DomainError::InvalidRoomState` outside the answer window or after
/// the player is ready, `DomainError::Validation` for an empty message and
/// `DomainError::PlayerNotFound` for strangers.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_submit_answers(
    command: &SubmitAnswers,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let answers = parse_answers(&command.raw, MAX_ANSWERS);

    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    ensure_window_open(ctx, &session)?;
    session.submit_answers(
        command.user_id,
        answers,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `MarkReady` command. Releases the round once every present
/// player is ready. Marking twice is a no-op.
///
/// # Errors
///
/// Returns `DomainError::InvalidRoomState` outside the answer window and
/// `DomainError::PlayerNotFound` for strangers.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_mark_ready(
    command: &MarkReady,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    ensure_window_open(ctx, &session)?;
    session.mark_ready(command.user_id, command.correlation_id, ctx.clock.as_ref())?;
    let events = commit(ctx, &mut session).await?;
    release_if_all_ready(ctx, &session);
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `AdjustScore` command.
///
/// # Errors
///
/// Returns `DomainError::NotAuthorized` for non-hosts,
/// `DomainError::InvalidRoomState` outside review and
/// `DomainError::PlayerNotFound` for an unknown target.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_adjust_score(
    command: &AdjustScore,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.adjust_score(
        command.user_id,
        command.target,
        command.delta,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `AdvanceRound` command: approves the reviewed round, then
/// either spawns the next round or, after the last one, announces the final
/// standings and deletes the room.
///
/// # Errors
///
/// Returns `DomainError::NotAuthorized` for non-hosts and
/// `DomainError::InvalidRoomState` outside review.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_advance_round(
    command: &AdvanceRound,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    let finished =
        session.approve_round(command.user_id, command.correlation_id, ctx.clock.as_ref())?;

    if finished {
        let events = close_room(ctx, &mut session, guard).await?;
        info!(room_code = %command.room_code, "game finished");
        return Ok(RoomCommandResult::new(command.room_code.clone(), events));
    }

    let events = commit(ctx, &mut session).await?;
    drop(guard);
    let round_task = spawn_round(ctx, command.room_code.clone(), command.correlation_id);
    Ok(RoomCommandResult {
        room_code: command.room_code.clone(),
        events,
        round_task: Some(round_task),
    })
}

/// Handles the `StopGame` command: wakes a waiting round, tells everyone but
/// the host, and deletes the room.
///
/// # Errors
///
/// Returns `DomainError::NotAuthorized` for non-hosts.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_stop_game(
    command: &StopGame,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.stop(command.user_id, command.correlation_id, ctx.clock.as_ref())?;
    ctx.rounds.release(&command.room_code, RoundSignal::Stopped);
    let events = close_room(ctx, &mut session, guard).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `LeaveRoom` command. The host leaving an unfinished room stops
/// it; anyone else is removed and the host is told.
///
/// # Errors
///
/// Returns `DomainError::PlayerNotFound` if the user is not seated.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_leave_room(
    command: &LeaveRoom,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;

    let events = match session.leave(command.user_id, command.correlation_id, ctx.clock.as_ref())? {
        LeaveOutcome::Stopped => {
            ctx.rounds.release(&command.room_code, RoundSignal::Stopped);
            close_room(ctx, &mut session, guard).await?
        }
        LeaveOutcome::Left { .. } => {
            ctx.repo
                .delete_player(&command.room_code, command.user_id)
                .await?;
            let events = commit(ctx, &mut session).await?;
            release_if_all_ready(ctx, &session);
            events
        }
    };
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `DisconnectPlayer` command. The player stops counting toward
/// readiness, which may release the round.
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` / `DomainError::PlayerNotFound` if the
/// seat does not exist.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_disconnect_player(
    command: &DisconnectPlayer,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.disconnect(command.user_id, command.correlation_id, ctx.clock.as_ref())?;
    let events = commit(ctx, &mut session).await?;
    release_if_all_ready(ctx, &session);
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}

/// Handles the `ReconnectPlayer` command according to the configured
/// [`RejoinPolicy`].
///
/// # Errors
///
/// Returns `DomainError::RoomNotFound` / `DomainError::PlayerNotFound` if the
/// seat does not exist.
#[instrument(
    skip(command, ctx),
    fields(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        room_code = %command.room_code,
        user_id = %command.user_id
    )
)]
pub async fn handle_reconnect_player(
    command: &ReconnectPlayer,
    ctx: &EngineContext,
) -> Result<RoomCommandResult, DomainError> {
    debug!("handling command");
    let reset = ctx.settings.rejoin_policy == RejoinPolicy::Reset;

    let _guard = ctx.locks.acquire(&command.room_code).await;
    let mut session = load_session(ctx.repo.as_ref(), &command.room_code).await?;
    session.reconnect(
        command.user_id,
        reset,
        command.correlation_id,
        ctx.clock.as_ref(),
    )?;
    let events = commit(ctx, &mut session).await?;
    Ok(RoomCommandResult::new(command.room_code.clone(), events))
}
