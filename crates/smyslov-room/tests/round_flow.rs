//! End-to-end rounds driven through the command handlers.

mod common;

use common::{
    ALICE, BOB, HOST, ROUND_SLEEPERS, advance_to_warning, answer, harness, ready, seat_room, secs,
    wait_for_round, warnings_for,
};
use smyslov_core::error::DomainError;
use smyslov_core::model::{RoomStatus, RoundPhase};
use smyslov_core::notifier::Notice;
use smyslov_core::repository::GameRepository;
use smyslov_room::application::command_handlers::{
    handle_add_custom_cards, handle_adjust_score, handle_advance_round, handle_disconnect_player, handle_leave_room,
    handle_mark_ready, handle_start_game, handle_stop_game,
};
use smyslov_room::application::round_coordinator::{AbortReason, RoundOutcome};
use smyslov_room::config::GameSettings;
use smyslov_room::domain::commands::{
    AddCustomCards, AdjustScore, AdvanceRound, DisconnectPlayer, LeaveRoom, MarkReady, StartGame, StopGame,
};
use smyslov_test_support::Delivery;
use uuid::Uuid;

fn start(code: &smyslov_core::model::RoomCode) -> StartGame {
    StartGame {
        correlation_id: Uuid::new_v4(),
        room_code: code.clone(),
        user_id: HOST,
    }
}

#[tokio::test]
async fn test_round_scores_early_when_everyone_is_ready() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;

    // Act
    answer(&h, &code, HOST, "Cat, dog").await;
    answer(&h, &code, ALICE, "cat\nfox").await;
    ready(&h, &code, HOST).await;
    ready(&h, &code, ALICE).await;
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    match outcome {
        RoundOutcome::Scored {
            round_number,
            results,
        } => {
            assert_eq!(round_number, 1);
            assert_eq!(results[0].user_id, HOST);
            assert_eq!(results[0].answers, vec!["cat", "dog"]);
            assert_eq!(results[0].scored, vec![true, false]);
            assert_eq!(results[0].total, 1);
            assert_eq!(results[1].total, 1);
        }
        other => panic!("expected Scored, got {other:?}"),
    }
    h.clock.wait_for_sleepers(0).await;
    assert_eq!(warnings_for(&h, HOST) + warnings_for(&h, ALICE), 0);
    let room = h.repo.room(&code).unwrap();
    assert_eq!(room.round_phase, RoundPhase::Reviewing);
    assert!(
        h.notifier
            .notices_for(HOST)
            .iter()
            .any(|n| matches!(n, Notice::HostPanel { round_number: 1, .. }))
    );
    assert!(
        h.notifier
            .notices_for(ALICE)
            .iter()
            .any(|n| matches!(n, Notice::RoundResults { round_number: 1, .. }))
    );
}

#[tokio::test]
async fn test_deadline_warns_only_players_not_ready() {
    // Arrange
    let h = harness();
    let settings = GameSettings::default();
    let code = seat_room(&h, &[(ALICE, "Alice"), (BOB, "Bob")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, BOB, 1).await;
    h.clock.wait_for_sleepers(ROUND_SLEEPERS).await;
    answer(&h, &code, HOST, "tea").await;
    ready(&h, &code, HOST).await;
    answer(&h, &code, ALICE, "tea").await;

    // Act
    advance_to_warning(&h, &settings, BOB).await;
    h.clock.advance(secs(5));
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    assert!(matches!(outcome, RoundOutcome::Scored { round_number: 1, .. }));
    assert_eq!(warnings_for(&h, HOST), 0);
    assert_eq!(warnings_for(&h, ALICE), 1);
    assert_eq!(warnings_for(&h, BOB), 1);
    assert!(
        h.notifier
            .notices_for(ALICE)
            .contains(&Notice::TimeRunningOut { seconds_left: 5 })
    );
}

#[tokio::test]
async fn test_ready_after_deadline_is_rejected() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    h.clock.wait_for_sleepers(ROUND_SLEEPERS).await;
    h.clock.advance(secs(60));
    started.round_task.unwrap().await.unwrap().unwrap();

    // Act
    let result = handle_mark_ready(
        &MarkReady {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: ALICE,
        },
        &h.ctx,
    )
    .await;

    // Assert
    match result {
        Err(DomainError::InvalidRoomState(_)) => {}
        other => panic!("expected InvalidRoomState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_deleted_before_scoring_aborts_round() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    h.clock.wait_for_sleepers(ROUND_SLEEPERS).await;
    answer(&h, &code, HOST, "tea").await;
    h.repo.delete_room(&code).await.unwrap();

    // Act
    h.clock.advance(secs(60));
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    assert_eq!(
        outcome,
        RoundOutcome::Aborted {
            round_number: 1,
            reason: AbortReason::RoomClosed,
        }
    );
    assert!(h.repo.room(&code).is_none());
    assert_eq!(warnings_for(&h, HOST) + warnings_for(&h, ALICE), 0);
}

#[tokio::test]
async fn test_room_finished_before_scoring_aborts_round() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    h.clock.wait_for_sleepers(ROUND_SLEEPERS).await;
    let mut room = h.repo.room(&code).unwrap();
    room.status = RoomStatus::Finished;
    h.repo.save_room(&room).await.unwrap();

    // Act
    h.clock.advance(secs(60));
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    match outcome {
        RoundOutcome::Aborted {
            round_number,
            reason,
        } => {
            assert_eq!(round_number, 1);
            assert_eq!(reason, AbortReason::RoomClosed);
        }
        other => panic!("expected Aborted, got {other:?}"),
    }
    let room = h.repo.room(&code).unwrap();
    assert_eq!(room.status, RoomStatus::Finished);
    assert_eq!(room.round_phase, RoundPhase::Collecting);
    assert!(
        !h.notifier
            .notices_for(ALICE)
            .iter()
            .any(|n| matches!(n, Notice::RoundResults { .. }))
    );
}

#[tokio::test]
async fn test_scoring_on_top_of_maximum_score_saturates() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    answer(&h, &code, HOST, "a").await;
    answer(&h, &code, ALICE, "a").await;
    ready(&h, &code, HOST).await;
    ready(&h, &code, ALICE).await;
    started.round_task.unwrap().await.unwrap().unwrap();
    handle_adjust_score(
        &AdjustScore {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: HOST,
            target: HOST,
            delta: i32::MAX,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    assert_eq!(h.repo.player(&code, HOST).unwrap().score, i32::MAX);
    let advanced = handle_advance_round(
        &AdvanceRound {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: HOST,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    wait_for_round(&h, ALICE, 2).await;

    // Act
    answer(&h, &code, HOST, "unique").await;
    answer(&h, &code, ALICE, "other").await;
    ready(&h, &code, HOST).await;
    ready(&h, &code, ALICE).await;
    let outcome = advanced.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    match outcome {
        RoundOutcome::Scored {
            round_number,
            results,
        } => {
            assert_eq!(round_number, 2);
            assert_eq!(results[0].user_id, HOST);
            assert_eq!(results[0].total, i32::MAX);
        }
        other => panic!("expected Scored, got {other:?}"),
    }
    assert_eq!(h.repo.player(&code, HOST).unwrap().score, i32::MAX);
}

#[tokio::test]
async fn test_stop_wakes_waiting_round() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;

    // Act
    handle_stop_game(
        &StopGame {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: HOST,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    assert_eq!(
        outcome,
        RoundOutcome::Aborted {
            round_number: 1,
            reason: AbortReason::Stopped,
        }
    );
    assert!(h.repo.room(&code).is_none());
    assert!(h.repo.player(&code, ALICE).is_none());
    assert!(h.notifier.deliveries().contains(&Delivery::Room {
        room_code: code.clone(),
        exclude: Some(HOST),
        notice: Notice::RoomStopped,
    }));
    h.clock.wait_for_sleepers(0).await;
}

#[tokio::test]
async fn test_only_host_controls_the_game() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;

    // Act
    let start_result = handle_start_game(
        &StartGame {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: ALICE,
        },
        &h.ctx,
    )
    .await;
    let stop_result = handle_stop_game(
        &StopGame {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: ALICE,
        },
        &h.ctx,
    )
    .await;

    // Assert
    assert!(matches!(start_result, Err(DomainError::NotAuthorized(_))));
    assert!(matches!(stop_result, Err(DomainError::NotAuthorized(_))));
    assert_eq!(h.repo.room(&code).unwrap().status, RoomStatus::Waiting);
}

#[tokio::test]
async fn test_full_game_ends_with_final_standings() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    handle_add_custom_cards(
        &AddCustomCards {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: HOST,
            raw: "Fruit\nCities".to_owned(),
            express: false,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    let mut task = handle_start_game(&start(&code), &h.ctx)
        .await
        .unwrap()
        .round_task;

    // Act
    for round in 1..=6 {
        wait_for_round(&h, ALICE, round).await;
        answer(&h, &code, HOST, "a").await;
        answer(&h, &code, ALICE, "a").await;
        ready(&h, &code, HOST).await;
        ready(&h, &code, ALICE).await;
        match task.take().unwrap().await.unwrap().unwrap() {
            RoundOutcome::Scored { round_number, .. } => assert_eq!(round_number, round),
            other => panic!("expected Scored, got {other:?}"),
        }
        let advanced = handle_advance_round(
            &AdvanceRound {
                correlation_id: Uuid::new_v4(),
                room_code: code.clone(),
                user_id: HOST,
            },
            &h.ctx,
        )
        .await
        .unwrap();
        task = advanced.round_task;
    }

    // Assert
    assert!(task.is_none());
    let game_over = h
        .notifier
        .room_notices(&code)
        .into_iter()
        .find_map(|n| match n {
            Notice::GameOver { standings } => Some(standings),
            _ => None,
        });
    match game_over {
        Some(standings) => {
            assert_eq!(standings.len(), 2);
            // Sync and express rounds score the shared answer, diff rounds do not.
            assert!(standings.iter().all(|s| s.score == 4));
        }
        None => panic!("expected GameOver broadcast"),
    }
    assert!(h.repo.room(&code).is_none());
    assert!(h.repo.cards().is_empty());
}

#[tokio::test]
async fn test_unreachable_player_does_not_abort_round() {
    // Arrange
    let h = harness();
    h.notifier.fail_for(ALICE);
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, HOST, 1).await;

    // Act
    answer(&h, &code, HOST, "sun").await;
    answer(&h, &code, ALICE, "moon").await;
    ready(&h, &code, HOST).await;
    ready(&h, &code, ALICE).await;
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    assert!(matches!(outcome, RoundOutcome::Scored { round_number: 1, .. }));
    assert!(h.notifier.notices_for(ALICE).is_empty());
    assert!(
        h.notifier
            .notices_for(HOST)
            .iter()
            .any(|n| matches!(n, Notice::HostPanel { .. }))
    );
}

#[tokio::test]
async fn test_leaving_player_releases_waiting_round() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice"), (BOB, "Bob")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, BOB, 1).await;
    ready(&h, &code, HOST).await;
    ready(&h, &code, ALICE).await;

    // Act
    handle_leave_room(
        &LeaveRoom {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: BOB,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    match outcome {
        RoundOutcome::Scored { results, .. } => assert_eq!(results.len(), 2),
        other => panic!("expected Scored, got {other:?}"),
    }
    assert!(
        h.notifier
            .notices_for(HOST)
            .iter()
            .any(|n| matches!(n, Notice::PlayerLeft { player_count: 2, .. }))
    );
}

#[tokio::test]
async fn test_disconnected_player_does_not_hold_round() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    handle_disconnect_player(
        &DisconnectPlayer {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: ALICE,
        },
        &h.ctx,
    )
    .await
    .unwrap();

    // Act
    answer(&h, &code, HOST, "rain").await;
    ready(&h, &code, HOST).await;
    let outcome = started.round_task.unwrap().await.unwrap().unwrap();

    // Assert
    assert!(matches!(outcome, RoundOutcome::Scored { round_number: 1, .. }));
}

#[tokio::test]
async fn test_storage_outage_fails_round_but_keeps_room() {
    // Arrange
    let h = harness();
    let code = seat_room(&h, &[(ALICE, "Alice")]).await;
    let started = handle_start_game(&start(&code), &h.ctx).await.unwrap();
    wait_for_round(&h, ALICE, 1).await;
    h.clock.wait_for_sleepers(ROUND_SLEEPERS).await;

    // Act
    h.repo.set_unavailable(true);
    h.clock.advance(secs(60));
    let result = started.round_task.unwrap().await.unwrap();
    h.repo.set_unavailable(false);

    // Assert
    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    let room = h.repo.room(&code).unwrap();
    assert_eq!(room.status, RoomStatus::Playing);
    assert_eq!(room.round_phase, RoundPhase::Collecting);
    handle_stop_game(
        &StopGame {
            correlation_id: Uuid::new_v4(),
            room_code: code.clone(),
            user_id: HOST,
        },
        &h.ctx,
    )
    .await
    .unwrap();
    assert!(h.repo.room(&code).is_none());
}
