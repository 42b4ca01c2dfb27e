//! Shared setup for the room integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use smyslov_core::model::{Card, RoomCode, UserId};
use smyslov_core::notifier::Notice;
use smyslov_room::application::command_handlers::{
    RoomCommandResult, handle_create_room, handle_join_room, handle_mark_ready,
    handle_submit_answers,
};
use smyslov_room::application::context::EngineContext;
use smyslov_room::config::GameSettings;
use smyslov_room::domain::commands::{CreateRoom, JoinRoom, MarkReady, SubmitAnswers};
use smyslov_test_support::{InMemoryRepository, ManualClock, MockRng, RecordingNotifier, init_tracing};
use uuid::Uuid;

pub const HOST: UserId = UserId(1);
pub const ALICE: UserId = UserId(2);
pub const BOB: UserId = UserId(3);

/// Sleeps parked while a round collects answers: the deadline warning and
/// the deadline itself.
pub const ROUND_SLEEPERS: usize = 2;

pub struct Harness {
    pub ctx: EngineContext,
    pub repo: Arc<InMemoryRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    harness_with(InMemoryRepository::new(), GameSettings::default())
}

pub fn harness_with(repo: InMemoryRepository, settings: GameSettings) -> Harness {
    init_tracing();
    let repo = Arc::new(repo);
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new());
    let ctx = EngineContext::new(
        repo.clone(),
        notifier.clone(),
        clock.clone(),
        Arc::new(Mutex::new(MockRng)),
        settings,
    );
    Harness {
        ctx,
        repo,
        notifier,
        clock,
    }
}

pub fn card(text: &str, is_blitz: bool) -> Card {
    Card {
        text: text.to_owned(),
        is_blitz,
        room_code: None,
    }
}

/// Creates a room hosted by [`HOST`] and seats `guests` in order.
pub async fn seat_room(h: &Harness, guests: &[(UserId, &str)]) -> RoomCode {
    let created = handle_create_room(
        &CreateRoom {
            correlation_id: Uuid::new_v4(),
            user_id: HOST,
            name: "Host".to_owned(),
        },
        &h.ctx,
    )
    .await
    .unwrap();
    for (user_id, name) in guests {
        handle_join_room(
            &JoinRoom {
                correlation_id: Uuid::new_v4(),
                room_code: created.room_code.clone(),
                user_id: *user_id,
                name: (*name).to_owned(),
            },
            &h.ctx,
        )
        .await
        .unwrap();
    }
    created.room_code
}

pub async fn answer(h: &Harness, code: &RoomCode, user_id: UserId, raw: &str) -> RoomCommandResult {
    handle_submit_answers(
        &SubmitAnswers {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id,
            raw: raw.to_owned(),
        },
        &h.ctx,
    )
    .await
    .unwrap()
}

pub async fn ready(h: &Harness, code: &RoomCode, user_id: UserId) -> RoomCommandResult {
    handle_mark_ready(
        &MarkReady {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id,
        },
        &h.ctx,
    )
    .await
    .unwrap()
}

pub fn warnings_for(h: &Harness, user_id: UserId) -> usize {
    h.notifier
        .notices_for(user_id)
        .iter()
        .filter(|n| matches!(n, Notice::TimeRunningOut { .. }))
        .count()
}

pub fn round_starts_for(h: &Harness, user_id: UserId) -> usize {
    h.notifier
        .notices_for(user_id)
        .iter()
        .filter(|n| matches!(n, Notice::RoundStarted { .. }))
        .count()
}

/// Moves the clock from the start of the round past the warning, then waits
/// until the warning reached `user_id`.
pub async fn advance_to_warning(h: &Harness, settings: &GameSettings, user_id: UserId) {
    h.clock.advance(settings.warning_delay());
    h.notifier
        .wait_until(|deliveries| {
            deliveries.iter().any(|d| {
                matches!(
                    d,
                    smyslov_test_support::Delivery::Player(to, Notice::TimeRunningOut { .. })
                        if *to == user_id
                )
            })
        })
        .await;
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Waits until `user_id` received the prompt of round `round_number`.
pub async fn wait_for_round(h: &Harness, user_id: UserId, round_number: u8) {
    h.notifier
        .wait_until(|deliveries| {
            deliveries.iter().any(|d| {
                matches!(
                    d,
                    smyslov_test_support::Delivery::Player(to, Notice::RoundStarted { round_number: n, .. })
                        if *to == user_id && *n == round_number
                )
            })
        })
        .await;
}
