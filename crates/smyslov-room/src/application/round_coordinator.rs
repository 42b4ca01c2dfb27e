//! Drives one round from prompt to scored results.
//!
//! A round runs in its own task:
//!
//! 1. Under the room lock, pick the prompt, open the round, persist it,
//!    register the round's barrier and send the prompt to every player.
//! 2. Schedule the deadline warning, then wait for the barrier (everyone
//!    ready, or a stop) or the deadline, whichever comes first.
//! 3. Close the window, which cancels a pending warning.
//! 4. Under the room lock again, re-check the room, score, persist and hand
//!    the results to the host for review.
//!
//! A failure aborts only the round; the room stays `playing` and the host
//! can still stop it.

use std::sync::Arc;

use smyslov_core::aggregate::AggregateRoot;
use smyslov_core::error::DomainError;
use smyslov_core::model::{RoomCode, RoomStatus, RoundType};
use smyslov_core::notifier::{Notice, ResultLine};
use smyslov_core::timer::DelayedTask;
use smyslov_scoring::application::prompt_selector::select_prompt;
use smyslov_scoring::domain::scoring::score_round;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::barrier::RoundSignal;
use super::command_handlers::{find_session, load_session, persist};
use super::context::EngineContext;
use super::publisher::{deliver, publish};
use super::registry::ActiveRound;

/// Why a round ended without scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The host stopped the room while answers were collected.
    Stopped,
    /// The room was gone or no longer playing when the window closed.
    RoomClosed,
}

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The round was scored and awaits the host.
    Scored {
        /// The round.
        round_number: u8,
        /// Per-player results in seat order.
        results: Vec<ResultLine>,
    },
    /// The round ended without scoring.
    Aborted {
        /// The round.
        round_number: u8,
        /// Why.
        reason: AbortReason,
    },
}

/// Handle of a running round task.
pub type RoundTask = JoinHandle<Result<RoundOutcome, DomainError>>;

/// Spawns the next round of `code`. Failures are logged by the task and
/// returned through the handle.
pub(crate) fn spawn_round(ctx: &EngineContext, code: RoomCode, correlation_id: Uuid) -> RoundTask {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        let result = run_round(&ctx, &code, correlation_id).await;
        match &result {
            Ok(RoundOutcome::Scored { round_number, .. }) => {
                info!(room_code = %code, round_number, "round scored");
            }
            Ok(RoundOutcome::Aborted {
                round_number,
                reason,
            }) => {
                warn!(room_code = %code, round_number, ?reason, "round aborted");
            }
            Err(err) => {
                error!(room_code = %code, error = %err, "round failed");
            }
        }
        result
    })
}

async fn run_round(
    ctx: &EngineContext,
    code: &RoomCode,
    correlation_id: Uuid,
) -> Result<RoundOutcome, DomainError> {
    let round = open_round(ctx, code, correlation_id).await?;
    let round_number = round.round_number;
    arm_warning(ctx, code, &round).await;

    let signal = tokio::select! {
        signal = round.barrier.wait() => signal,
        () = ctx.clock.sleep(ctx.settings.round_duration) => {
            round.barrier.release(RoundSignal::Expired);
            round.barrier.signal()
        }
    };
    round.close().await;
    ctx.rounds.remove(code, &round);
    info!(room_code = %code, round_number, ?signal, "answer window closed");

    if signal == RoundSignal::Stopped {
        return Ok(RoundOutcome::Aborted {
            round_number,
            reason: AbortReason::Stopped,
        });
    }
    score(ctx, code, round_number, correlation_id).await
}

async fn open_round(
    ctx: &EngineContext,
    code: &RoomCode,
    correlation_id: Uuid,
) -> Result<Arc<ActiveRound>, DomainError> {
    let _guard = ctx.locks.acquire(code).await;
    let mut session = load_session(ctx.repo.as_ref(), code).await?;
    let round_type = session.next_round_type()?;
    let selected = select_prompt(code, round_type, ctx.repo.as_ref(), ctx.rng.as_ref()).await?;

    let round_number = session.open_round(selected.prompt, correlation_id, ctx.clock.as_ref())?;
    persist(ctx.repo.as_ref(), &session).await?;
    let round = ctx.rounds.open(code.clone(), round_number);

    let events = session.take_uncommitted_events();
    publish(ctx.notifier.as_ref(), &session, &events).await;
    Ok(round)
}

async fn arm_warning(ctx: &EngineContext, code: &RoomCode, round: &Arc<ActiveRound>) {
    let seconds_left = ctx.settings.warning_lead.as_secs();
    let clock = Arc::clone(&ctx.clock);
    let task = {
        let ctx = ctx.clone();
        let code = code.clone();
        let round = Arc::clone(round);
        DelayedTask::schedule(clock, ctx.settings.warning_delay(), async move {
            let sent = round
                .while_open(warn_stragglers(&ctx, &code, &round, seconds_left))
                .await;
            if !sent {
                info!(room_code = %code, "deadline warning skipped");
            }
        })
    };
    round.arm_warning(task).await;
}

/// Warns connected players who are not ready yet, provided the room is still
/// playing the same round. Stops early once the round is released.
async fn warn_stragglers(
    ctx: &EngineContext,
    code: &RoomCode,
    round: &ActiveRound,
    seconds_left: u64,
) {
    let round_number = round.round_number;
    let room = match ctx.repo.get_room(code).await {
        Ok(Some(room)) => room,
        Ok(None) => return,
        Err(err) => {
            warn!(room_code = %code, error = %err, "warning skipped: room unavailable");
            return;
        }
    };
    if room.status != RoomStatus::Playing || room.round_number != round_number {
        return;
    }
    let players = match ctx.repo.list_players(code).await {
        Ok(players) => players,
        Err(err) => {
            warn!(room_code = %code, error = %err, "warning skipped: players unavailable");
            return;
        }
    };

    let notice = Notice::TimeRunningOut { seconds_left };
    let mut warned = 0_usize;
    for player in players.iter().filter(|p| p.connected && !p.is_ready) {
        if !round.barrier.is_open() {
            break;
        }
        deliver(ctx.notifier.as_ref(), player.user_id, &notice).await;
        warned += 1;
    }
    info!(room_code = %code, round_number, warned, "deadline warning sent");
}

async fn score(
    ctx: &EngineContext,
    code: &RoomCode,
    round_number: u8,
    correlation_id: Uuid,
) -> Result<RoundOutcome, DomainError> {
    let aborted = RoundOutcome::Aborted {
        round_number,
        reason: AbortReason::RoomClosed,
    };
    let _guard = ctx.locks.acquire(code).await;
    let Some(mut session) = find_session(ctx.repo.as_ref(), code).await? else {
        return Ok(aborted);
    };
    if session.room.status != RoomStatus::Playing || session.room.round_number != round_number {
        return Ok(aborted);
    }

    let round_type = RoundType::from_round(round_number)?;
    let scores = score_round(round_type, &session.submissions());
    let results = session.record_scores(&scores, correlation_id, ctx.clock.as_ref())?;
    persist(ctx.repo.as_ref(), &session).await?;

    let events = session.take_uncommitted_events();
    publish(ctx.notifier.as_ref(), &session, &events).await;
    Ok(RoundOutcome::Scored {
        round_number,
        results,
    })
}
