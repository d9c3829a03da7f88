use jollydash::app::AppState;
use jollydash::codec::{self, WireState};
use jollydash::config::SyncConfig;
use jollydash::protocol::{ClientMessage, ServerMessage};
use jollydash::state::{Action, TransitionError};
use jollydash::sync::{BuzzOutcome, GameStore, MemoryStore, SyncController, SyncError};
use jollydash::types::{ActiveQuestion, GameState, PowerupKind, TeamId, TeamPowerups};
use jollydash::ws::handlers::handle_message;
use jollydash::ws::Connection;
use std::sync::Arc;

fn team(n: u8) -> TeamId {
    TeamId::new(n).unwrap()
}

async fn controller(store: &Arc<MemoryStore>) -> Arc<SyncController> {
    let store: Arc<dyn GameStore> = store.clone();
    let controller = Arc::new(SyncController::new(store, SyncConfig::default()));
    controller.init().await.unwrap();
    controller
}

/// A server with its own controller on a shared store
async fn server(store: &Arc<MemoryStore>) -> Arc<AppState> {
    Arc::new(AppState::new(controller(store).await))
}

fn acked(response: Option<ServerMessage>) -> GameState {
    match response {
        Some(ServerMessage::Ack { state: Some(wire) }) => codec::decode(&wire),
        other => panic!("Expected Ack with state, got {:?}", other),
    }
}

fn error_code(response: Option<ServerMessage>) -> String {
    match response {
        Some(ServerMessage::Error { code, .. }) => code,
        other => panic!("Expected Error, got {:?}", other),
    }
}

async fn host_action(state: &Arc<AppState>, action: Action) -> Option<ServerMessage> {
    handle_message(
        ClientMessage::HostAction { action },
        &Connection::host(),
        state,
    )
    .await
}

/// End-to-end flow for one question round with a buzzer race
#[tokio::test]
async fn test_full_round_flow() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    let display = controller(&store).await;

    // 1. Host creates the game
    let created = acked(
        handle_message(ClientMessage::HostCreateGame, &Connection::host(), &host).await,
    );
    assert_eq!(created, GameState::default());
    assert_eq!(display.current(), Some(GameState::default()));

    // 2. Host shows a question from slot 7
    let question = ActiveQuestion::new("Who leads the sleigh?", "Rudolph", 400, false).unwrap();
    let shown = acked(
        host_action(
            &host,
            Action::ShowQuestion {
                question,
                slot: Some(7),
            },
        )
        .await,
    );
    assert!(shown.is_used(7));
    assert!(!shown.answer_revealed());

    // 3. Buzzer race: team 3 first, team 1 second
    host_action(&host, Action::OpenBuzzer).await;
    let team_three = server(&store).await;
    let team_one = server(&store).await;

    let first = handle_message(
        ClientMessage::Buzz { team: team(3) },
        &Connection::team(team(3)),
        &team_three,
    )
    .await;
    assert!(matches!(
        first,
        Some(ServerMessage::BuzzResult { won: true, winner, .. }) if winner == team(3)
    ));

    let second = handle_message(
        ClientMessage::Buzz { team: team(1) },
        &Connection::team(team(1)),
        &team_one,
    )
    .await;
    assert!(matches!(
        second,
        Some(ServerMessage::BuzzResult { won: false, winner, .. }) if winner == team(3)
    ));

    // 4. Host hands the turn to the winner and marks the answer correct
    host_action(&host, Action::SetCurrentTeam { team: team(3) }).await;
    let scored = acked(host_action(&host, Action::MarkCorrect).await);
    assert_eq!(scored.team_scores(), &[0, 0, 400, 0, 0]);
    assert!(scored.answer_revealed());

    // 5. Back to the board; every screen agrees
    let board = acked(host_action(&host, Action::ReturnToBoard).await);
    assert!(board.active_question().is_none());
    assert_eq!(display.current(), Some(board.clone()));
    assert_eq!(team_one.controller.current(), Some(board.clone()));
    assert_eq!(store.record().await.unwrap().state, codec::encode(&board));
}

#[tokio::test]
async fn test_candy_scenario() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    host.controller.create_game().await.unwrap();

    host_action(
        &host,
        Action::GrantPowerup {
            team: team(2),
            kind: PowerupKind::Candy,
        },
    )
    .await;
    let state = acked(
        host_action(
            &host,
            Action::UsePowerup {
                team: team(2),
                kind: PowerupKind::Candy,
            },
        )
        .await,
    );

    assert_eq!(state.powerups(team(2)), TeamPowerups::default());
    assert_eq!(state.team_scores(), &[0, 50, 0, 0, 0]);
}

#[tokio::test]
async fn test_steal_with_equal_scores_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    host.controller.create_game().await.unwrap();
    for n in 1..=5 {
        host_action(
            &host,
            Action::SetScore {
                team: team(n),
                score: 100,
            },
        )
        .await;
    }
    let before = store.record().await.unwrap();

    let response = host_action(&host, Action::StealFromLeader { amount: 150 }).await;
    assert_eq!(error_code(response), "SCORES_TOO_CLOSE");
    assert_eq!(store.record().await.unwrap(), before);
}

#[tokio::test]
async fn test_non_host_cannot_write() {
    let store = Arc::new(MemoryStore::new());
    let state = server(&store).await;
    state.controller.create_game().await.unwrap();

    let team_screen = Connection::team(team(2));
    for msg in [
        ClientMessage::HostAction {
            action: Action::AddPoints {
                team: team(2),
                points: 1000,
            },
        },
        ClientMessage::HostRandomSwing,
        ClientMessage::HostCreateGame,
        ClientMessage::HostDeleteGame,
    ] {
        let response = handle_message(msg, &team_screen, &state).await;
        assert_eq!(error_code(response), "UNAUTHORIZED");
    }

    let response = handle_message(
        ClientMessage::HostDeleteGame,
        &Connection::display(),
        &state,
    )
    .await;
    assert_eq!(error_code(response), "UNAUTHORIZED");
    assert_eq!(state.controller.current(), Some(GameState::default()));
}

#[tokio::test]
async fn test_team_can_only_buzz_for_itself() {
    let store = Arc::new(MemoryStore::new());
    let state = server(&store).await;
    state.controller.create_game().await.unwrap();
    state.controller.apply(Action::OpenBuzzer).await.unwrap();

    let response = handle_message(
        ClientMessage::Buzz { team: team(4) },
        &Connection::team(team(2)),
        &state,
    )
    .await;
    assert_eq!(error_code(response), "UNAUTHORIZED");
    assert!(state.controller.current().unwrap().buzzer_active());
}

#[tokio::test]
async fn test_buzz_before_race_opens() {
    let store = Arc::new(MemoryStore::new());
    let state = server(&store).await;
    state.controller.create_game().await.unwrap();

    let response = handle_message(
        ClientMessage::Buzz { team: team(1) },
        &Connection::team(team(1)),
        &state,
    )
    .await;
    assert_eq!(error_code(response), "RACE_NOT_OPEN");
}

#[tokio::test]
async fn test_reopened_race_can_be_won_again() {
    let store = Arc::new(MemoryStore::new());
    let host = controller(&store).await;
    let team_two = controller(&store).await;
    let team_four = controller(&store).await;
    host.create_game().await.unwrap();

    host.apply(Action::OpenBuzzer).await.unwrap();
    assert_eq!(team_two.buzz(team(2)).await.unwrap(), BuzzOutcome::Won);
    assert_eq!(
        team_four.buzz(team(4)).await.unwrap(),
        BuzzOutcome::TooLate { winner: team(2) }
    );

    host.apply(Action::OpenBuzzer).await.unwrap();
    assert_eq!(team_four.buzz(team(4)).await.unwrap(), BuzzOutcome::Won);
    assert_eq!(host.current().unwrap().buzzer_winner(), Some(team(4)));
}

#[tokio::test]
async fn test_random_swing_moves_one_score() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    host.controller.create_game().await.unwrap();

    let state = acked(
        handle_message(ClientMessage::HostRandomSwing, &Connection::host(), &host).await,
    );
    let changed: Vec<i64> = state
        .team_scores()
        .iter()
        .copied()
        .filter(|score| *score != 0)
        .collect();
    assert_eq!(changed.len(), 1);
    assert!(jollydash::state::RANDOM_SWINGS.contains(&changed[0]));
}

#[tokio::test]
async fn test_writes_disabled_reports_code() {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn GameStore> = store.clone();
    let config = SyncConfig {
        allow_writes: false,
        ..SyncConfig::default()
    };
    let controller = Arc::new(SyncController::new(dyn_store, config));
    controller.init().await.unwrap();
    let state = Arc::new(AppState::new(controller));

    let response =
        handle_message(ClientMessage::HostCreateGame, &Connection::host(), &state).await;
    assert_eq!(error_code(response), "WRITES_DISABLED");
    assert!(store.record().await.is_none());
}

#[tokio::test]
async fn test_actions_without_game() {
    let store = Arc::new(MemoryStore::new());
    let state = server(&store).await;
    let response = host_action(&state, Action::MarkAllUsed).await;
    assert_eq!(error_code(response), "NO_GAME");
}

#[tokio::test]
async fn test_store_rejection_keeps_last_good_state() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    host.controller.create_game().await.unwrap();
    store.set_reject_writes(true);

    let response = host_action(
        &host,
        Action::RenameTeam {
            team: team(1),
            name: "Elves".to_string(),
        },
    )
    .await;
    assert_eq!(error_code(response), "STORE_REJECTED");
    assert_eq!(host.controller.current(), Some(GameState::default()));

    store.set_reject_writes(false);
    let renamed = acked(
        host_action(
            &host,
            Action::RenameTeam {
                team: team(1),
                name: "Elves".to_string(),
            },
        )
        .await,
    );
    assert_eq!(renamed.team_name(team(1)), "Elves");
}

#[tokio::test]
async fn test_delete_then_recreate() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    let display = controller(&store).await;
    host.controller.create_game().await.unwrap();
    host.controller
        .apply(Action::AddPoints {
            team: team(5),
            points: 300,
        })
        .await
        .unwrap();

    let response =
        handle_message(ClientMessage::HostDeleteGame, &Connection::host(), &host).await;
    assert!(matches!(response, Some(ServerMessage::Ack { state: None })));
    assert!(display.current().is_none());

    let again = handle_message(ClientMessage::HostDeleteGame, &Connection::host(), &host).await;
    assert_eq!(error_code(again), "NO_GAME");

    let created = acked(
        handle_message(ClientMessage::HostCreateGame, &Connection::host(), &host).await,
    );
    assert_eq!(created.team_scores(), &[0; 5]);
    assert_eq!(display.current(), Some(created));
}

#[tokio::test]
async fn test_create_twice_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let host = server(&store).await;
    host.controller.create_game().await.unwrap();
    let response =
        handle_message(ClientMessage::HostCreateGame, &Connection::host(), &host).await;
    assert_eq!(error_code(response), "GAME_EXISTS");
}

#[tokio::test]
async fn test_legacy_record_is_adopted() {
    // Record written by an older client: numeric fields and a short score list
    let legacy: WireState = serde_json::from_value(serde_json::json!({
        "used_questions": "0,1,2",
        "team_scores": "300,-100",
        "current_team": 2,
        "next_multiplier": 2,
        "buzzer_active": "false",
        "active_question": ""
    }))
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    store.create(legacy).await.unwrap();

    let screen = controller(&store).await;
    let state = screen.current().unwrap();
    assert_eq!(state.team_scores(), &[300, -100, 0, 0, 0]);
    assert_eq!(state.current_team(), team(2));
    assert_eq!(state.next_multiplier(), 2);
    assert_eq!(state.team_name(team(5)), "Team 5");
    assert!(state.is_used(2));
}

#[tokio::test]
async fn test_mark_wrong_without_question() {
    let store = Arc::new(MemoryStore::new());
    let host = controller(&store).await;
    host.create_game().await.unwrap();

    let result = host.apply(Action::MarkWrong).await;
    assert!(matches!(
        result,
        Err(SyncError::Transition(TransitionError::NoActiveQuestion))
    ));
}

#[tokio::test]
async fn test_ping() {
    let store = Arc::new(MemoryStore::new());
    let state = server(&store).await;
    let response = handle_message(ClientMessage::Ping, &Connection::display(), &state).await;
    assert!(matches!(response, Some(ServerMessage::Pong)));
}
