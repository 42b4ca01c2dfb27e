//! Turns recorded room events into log lines and player notices.
//!
//! Delivery is best-effort: a failure for one recipient is logged and the
//! remaining recipients are still served.

use smyslov_core::event::DomainEvent;
use smyslov_core::model::{RoomCode, UserId};
use smyslov_core::notifier::{Notice, Notifier};
use tracing::{debug, info, warn};

use crate::domain::aggregates::RoomSession;
use crate::domain::events::{RoomEvent, RoomEventKind};

pub(crate) async fn deliver(notifier: &dyn Notifier, user_id: UserId, notice: &Notice) {
    if let Err(error) = notifier.notify_player(user_id, notice).await {
        warn!(user_id = %user_id, error = %error, "notice delivery failed");
    }
}

async fn broadcast(
    notifier: &dyn Notifier,
    room_code: &RoomCode,
    notice: &Notice,
    exclude: Option<UserId>,
) {
    if let Err(error) = notifier.notify_room(room_code, notice, exclude).await {
        warn!(room_code = %room_code, error = %error, "room broadcast failed");
    }
}

fn log_event(event: &RoomEvent) {
    let meta = event.metadata();
    info!(
        event_type = event.event_type(),
        room_code = %meta.room_code,
        round_number = meta.round_number,
        correlation_id = %meta.correlation_id,
        "room event"
    );
    debug!(payload = %event.to_payload(), "room event payload");
}

/// Logs `events` and sends the notices they imply. `session` is the state
/// after the events were recorded.
pub(crate) async fn publish(notifier: &dyn Notifier, session: &RoomSession, events: &[RoomEvent]) {
    let room = &session.room;
    for event in events {
        log_event(event);
        match &event.kind {
            RoomEventKind::RoomCreated(payload) => {
                let notice = Notice::RoomCreated {
                    room_code: room.code.clone(),
                };
                deliver(notifier, payload.host_id, &notice).await;
            }
            RoomEventKind::PlayerJoined(payload) => {
                let joined = Notice::JoinedRoom {
                    room_code: room.code.clone(),
                };
                deliver(notifier, payload.user_id, &joined).await;
                let notice = Notice::PlayerJoined {
                    name: payload.name.clone(),
                    player_count: payload.player_count,
                };
                deliver(notifier, room.host_id, &notice).await;
            }
            RoomEventKind::PlayerRenamed(payload) => {
                let notice = Notice::NameChanged {
                    name: payload.name.clone(),
                };
                deliver(notifier, payload.user_id, &notice).await;
            }
            RoomEventKind::CustomCardsAdded(payload) => {
                let notice = Notice::CardsAdded {
                    added: payload.added,
                    rejected: payload.rejected,
                };
                deliver(notifier, room.host_id, &notice).await;
            }
            RoomEventKind::GameStarted(payload) => {
                let notice = Notice::GameStarted {
                    player_count: payload.player_count,
                };
                broadcast(notifier, &room.code, &notice, None).await;
            }
            RoomEventKind::RoundStarted(payload) => {
                let notice = Notice::RoundStarted {
                    round_number: payload.round_number,
                    round_type: payload.round_type,
                    prompt: payload.prompt.clone(),
                };
                for player in &session.players {
                    deliver(notifier, player.user_id, &notice).await;
                }
            }
            RoomEventKind::AnswersSubmitted(payload) => {
                let notice = Notice::AnswersAccepted {
                    answers: payload.answers.clone(),
                };
                deliver(notifier, payload.user_id, &notice).await;
            }
            RoomEventKind::PlayerReady(payload) => {
                let notice = Notice::ReadyAcknowledged {
                    ready: payload.ready,
                    total: payload.total,
                };
                deliver(notifier, payload.user_id, &notice).await;
            }
            RoomEventKind::PlayerDisconnected(_) | RoomEventKind::PlayerReconnected(_) => {}
            RoomEventKind::RoundScored(payload) => {
                let results = Notice::RoundResults {
                    round_number: payload.round_number,
                    results: payload.results.clone(),
                };
                let panel = Notice::HostPanel {
                    round_number: payload.round_number,
                    results: payload.results.clone(),
                    standings: session.standings(),
                };
                for player in &session.players {
                    let notice = if room.is_host(player.user_id) {
                        &panel
                    } else {
                        &results
                    };
                    deliver(notifier, player.user_id, notice).await;
                }
            }
            RoomEventKind::ScoreAdjusted(payload) => {
                let notice = Notice::ScoreAdjusted {
                    name: payload.name.clone(),
                    delta: payload.delta,
                    score: payload.score,
                };
                deliver(notifier, room.host_id, &notice).await;
            }
            RoomEventKind::RoundApproved(payload) => {
                let notice = Notice::RoundApproved {
                    round_number: payload.round_number,
                    standings: payload.standings.clone(),
                };
                broadcast(notifier, &room.code, &notice, None).await;
            }
            RoomEventKind::GameFinished(payload) => {
                let notice = Notice::GameOver {
                    standings: payload.standings.clone(),
                };
                broadcast(notifier, &room.code, &notice, None).await;
            }
            RoomEventKind::PlayerLeft(payload) => {
                let notice = Notice::PlayerLeft {
                    name: payload.name.clone(),
                    player_count: payload.player_count,
                };
                deliver(notifier, room.host_id, &notice).await;
            }
            RoomEventKind::RoomStopped(payload) => {
                broadcast(
                    notifier,
                    &room.code,
                    &Notice::RoomStopped,
                    Some(payload.stopped_by),
                )
                .await;
            }
        }
    }
}
