use std::sync::Arc;

use protocol::{Envelope, MessageType, OutgoingMessage};
use referee_core::{AssignmentStatus, PlayerGuess, SeasonState};
use serde_json::{json, Value};

use super::SeasonOrchestrator;
use crate::config::RefereeConfig;
use crate::deadlines::DeadlinePhase;
use crate::error::OrchestratorError;
use crate::game::test_support::TestAi;

async fn orchestrator(ai: Arc<TestAi>) -> SeasonOrchestrator {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let config = RefereeConfig::new("REF01", "ref@test.com")
        .with_group("G1")
        .with_league("L01", "S01")
        .with_league_manager("lm@test.com");
    SeasonOrchestrator::new(config, ai, pool).await.unwrap()
}

fn broadcast(message_type: &str, broadcast_id: &str, payload: Value) -> Envelope {
    let mut payload = payload;
    payload["broadcast_id"] = json!(broadcast_id);
    Envelope::from_value(json!({
        "protocol": "league.v2",
        "message_type": message_type,
        "message_id": format!("msg-{broadcast_id}"),
        "timestamp": "2026-01-05T10:00:00.000000+00:00",
        "sender": {"email": "lm@test.com", "role": "LEAGUEMANAGER"},
        "recipient_id": "REF01",
        "league_id": "L01",
        "season_id": "S01",
        "payload": payload,
    }))
    .unwrap()
}

fn assignment_table(broadcast_id: &str) -> Envelope {
    broadcast(
        "BROADCAST_ASSIGNMENT_TABLE",
        broadcast_id,
        json!({
            "season_id": "S01",
            "assignments": [
                {"role": "referee", "email": "ref@test.com", "game_id": "0101001", "group_id": "G1"},
                {"role": "player1", "email": "p1@test.com", "game_id": "0101001", "group_id": "P1"},
                {"role": "player2", "email": "p2@test.com", "game_id": "0101001", "group_id": "P2"},
                {"role": "referee", "email": "other@test.com", "game_id": "0101002", "group_id": "G9"},
                {"role": "player1", "email": "p3@test.com", "game_id": "0101002", "group_id": "P3"},
                {"role": "player2", "email": "p4@test.com", "game_id": "0101002", "group_id": "P4"},
            ],
        }),
    )
}

fn new_round(broadcast_id: &str, round: u32) -> Envelope {
    broadcast(
        "BROADCAST_NEW_LEAGUE_ROUND",
        broadcast_id,
        json!({"round_id": format!("ROUND_{round}"), "round_number": round}),
    )
}

fn player(message_type: &str, sender: &str, payload: Value) -> Value {
    json!({
        "message_type": message_type,
        "message_id": format!("{message_type}-{sender}"),
        "sender": {"email": sender},
        "game_id": "0101001",
        "payload": payload,
    })
}

fn types(out: &[OutgoingMessage]) -> Vec<MessageType> {
    out.iter().filter_map(OutgoingMessage::message_type).collect()
}

/// Drives the season to RUNNING with game 0101001 assigned for round 1.
async fn registered(ai: Arc<TestAi>) -> SeasonOrchestrator {
    let mut orch = orchestrator(ai).await;
    orch.handle_control_message(&broadcast("BROADCAST_START_SEASON", "b-start", json!({"season_id": "S01"})))
        .await;
    orch.handle_control_message(&broadcast(
        "SEASON_REGISTRATION_RESPONSE",
        "b-reg",
        json!({"status": "accepted"}),
    ))
    .await;
    orch.handle_control_message(&assignment_table("b-table")).await;
    orch
}

#[tokio::test]
async fn test_start_season_requests_registration() {
    let mut orch = orchestrator(Arc::new(TestAi::default())).await;
    let out = orch
        .handle_control_message(&broadcast("BROADCAST_START_SEASON", "b-start", json!({"season_id": "S02"})))
        .await;

    assert_eq!(types(&out), vec![MessageType::SeasonRegistrationRequest]);
    assert_eq!(out[0].recipient, "lm@test.com");
    assert_eq!(out[0].envelope.correlation_id.as_deref(), Some("msg-b-start"));
    assert_eq!(out[0].envelope.payload_str("season_id"), Some("S02"));
    assert_eq!(orch.season_id(), "S02");
    assert_eq!(orch.state(), SeasonState::WaitingForConfirmation);
}

#[tokio::test]
async fn test_rejected_registration_returns_to_init() {
    let mut orch = orchestrator(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&broadcast("BROADCAST_START_SEASON", "b-start", json!({})))
        .await;
    orch.handle_control_message(&broadcast(
        "SEASON_REGISTRATION_RESPONSE",
        "b-reg",
        json!({"status": "rejected", "reason": "full"}),
    ))
    .await;
    assert_eq!(orch.state(), SeasonState::InitStartState);
}

#[tokio::test]
async fn test_assignment_table_keeps_own_games_and_acks() {
    let orch = registered(Arc::new(TestAi::default())).await;
    assert_eq!(orch.state(), SeasonState::Running);

    let stored = orch.repos.assignments.list_for_season("S01").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].game_id, "0101001");
    assert_eq!(stored[0].round_number, 1);
    assert_eq!(stored[0].player1.id, "P1");
    assert_eq!(stored[0].player2.email, "p2@test.com");
}

#[tokio::test]
async fn test_duplicate_assignment_table_is_a_noop() {
    let mut orch = orchestrator(Arc::new(TestAi::default())).await;
    let first = orch.handle_control_message(&assignment_table("b-table")).await;
    assert_eq!(types(&first), vec![MessageType::ResponseGroupAssignment]);
    assert_eq!(first[0].envelope.payload_u64("assignments_received"), Some(1));

    let mut rx = orch.events().subscribe();
    let second = orch.handle_control_message(&assignment_table("b-table")).await;
    assert!(second.is_empty());
    assert_eq!(orch.repos.assignments.list_for_season("S01").await.unwrap().len(), 1);
    assert!(matches!(
        rx.recv().await.unwrap().event,
        events::RefereeEvent::BroadcastDuplicate { .. }
    ));
}

#[tokio::test]
async fn test_broadcast_ledger_survives_restart() {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let config = RefereeConfig::new("REF01", "ref@test.com")
        .with_league("L01", "S01")
        .with_league_manager("lm@test.com");

    let mut first = SeasonOrchestrator::new(config.clone(), Arc::new(TestAi::default()), pool.clone())
        .await
        .unwrap();
    let keep_alive = broadcast("BROADCAST_KEEP_ALIVE", "b-ka", json!({}));
    assert_eq!(first.handle_control_message(&keep_alive).await.len(), 1);

    let mut second = SeasonOrchestrator::new(config, Arc::new(TestAi::default()), pool)
        .await
        .unwrap();
    assert!(second.handle_control_message(&keep_alive).await.is_empty());
}

#[tokio::test]
async fn test_new_round_starts_assigned_game() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    let out = orch.handle_control_message(&new_round("b-r1", 1)).await;

    assert_eq!(
        types(&out),
        vec![MessageType::Q21WarmupCall, MessageType::Q21WarmupCall]
    );
    assert_eq!(orch.state(), SeasonState::InGame);
    assert_eq!(orch.active_game().unwrap().game_id(), "0101001");
    assert_eq!(orch.deadlines().len(), 2);

    let assignment = orch
        .repos
        .assignments
        .find_by_match("S01", "0101001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::InProgress);
}

#[tokio::test]
async fn test_new_round_without_assignment_is_ignored() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    let out = orch.handle_control_message(&new_round("b-r2", 2)).await;
    assert!(out.is_empty());
    assert!(orch.active_game().is_none());
    assert_eq!(orch.state(), SeasonState::Running);
}

#[tokio::test]
async fn test_player_message_for_other_game_is_rejected() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;

    let mut body = player("Q21WARMUPRESPONSE", "p1@test.com", json!({"answer": "4"}));
    body["game_id"] = json!("0101009");
    let err = orch.route_player_message(&body).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::GameMismatch { .. }));
}

#[tokio::test]
async fn test_same_round_again_is_a_noop() {
    let ai = Arc::new(TestAi::default());
    let mut orch = registered(ai.clone()).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    orch.route_player_message(&player("Q21WARMUPRESPONSE", "p1@test.com", json!({"answer": "4"})))
        .await
        .unwrap();

    let out = orch.handle_control_message(&new_round("b-r1-again", 1)).await;
    assert!(out.is_empty());
    let game = orch.active_game().unwrap();
    assert_eq!(game.game_id(), "0101001");
    assert_eq!(game.state().player1.as_ref().unwrap().warmup_answer.as_deref(), Some("4"));
    assert_eq!(orch.state(), SeasonState::InGame);
}

#[tokio::test]
async fn test_abort_scores_pending_guess_with_zero_fallback() {
    let ai = Arc::new(TestAi {
        fail_scoring: true,
        ..Default::default()
    });
    let mut orch = registered(ai.clone()).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    orch.game
        .as_mut()
        .unwrap()
        .state_mut()
        .player1
        .as_mut()
        .unwrap()
        .guess = Some(PlayerGuess::default());

    let out = orch.abort_current_game("round ended").await;
    assert_eq!(
        types(&out),
        vec![MessageType::Q21ScoreFeedback, MessageType::MatchResultReport]
    );
    assert_eq!(out[0].recipient, "p1@test.com");
    assert_eq!(out[0].envelope.payload["league_points"], 0);
    assert_eq!(out[1].envelope.payload_str("status"), Some("aborted"));
    assert_eq!(ai.score_calls(), 1);
    assert!(orch.active_game().is_none());
}

#[tokio::test]
async fn test_player_message_without_game_is_rejected() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    let body = player("Q21WARMUPRESPONSE", "p1@test.com", json!({"answer": "4"}));
    let err = orch.route_player_message(&body).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NoActiveGame));
}

#[tokio::test]
async fn test_pause_defers_broadcasts_and_rejects_players() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    orch.handle_control_message(&broadcast(
        "BROADCAST_CRITICAL_PAUSE",
        "b-pause",
        json!({"reason": "maintenance"}),
    ))
    .await;
    assert_eq!(orch.state(), SeasonState::Paused);
    assert_eq!(orch.pause_reason(), Some("maintenance"));

    let body = player("Q21WARMUPRESPONSE", "p1@test.com", json!({"answer": "4"}));
    let err = orch.route_player_message(&body).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Paused { .. }));

    let end_round = broadcast("BROADCAST_END_LEAGUE_ROUND", "b-end1", json!({"round_number": 1}));
    assert!(orch.handle_control_message(&end_round).await.is_empty());
    assert!(orch.active_game().is_some());

    let keep_alive = orch
        .handle_control_message(&broadcast("BROADCAST_KEEP_ALIVE", "b-ka", json!({})))
        .await;
    assert_eq!(types(&keep_alive), vec![MessageType::ResponseKeepAlive]);

    orch.handle_control_message(&broadcast("BROADCAST_CRITICAL_CONTINUE", "b-cont", json!({})))
        .await;
    assert_eq!(orch.state(), SeasonState::InGame);
    assert!(orch.pause_reason().is_none());

    // The deferred end-of-round was not recorded, so a redelivery applies.
    let out = orch.handle_control_message(&end_round).await;
    assert_eq!(types(&out), vec![MessageType::MatchResultReport]);
}

#[tokio::test]
async fn test_critical_reset_aborts_and_clears_assignments() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    orch.handle_control_message(&broadcast("BROADCAST_CRITICAL_PAUSE", "b-pause", json!({})))
        .await;

    let out = orch
        .handle_control_message(&broadcast("BROADCAST_CRITICAL_RESET", "b-reset", json!({})))
        .await;
    assert_eq!(types(&out), vec![MessageType::MatchResultReport]);
    assert_eq!(out[0].envelope.payload_str("abort_reason"), Some("critical reset"));
    assert_eq!(orch.state(), SeasonState::InitStartState);
    assert!(orch.active_game().is_none());
    assert!(orch.pause_reason().is_none());
    assert!(orch.repos.assignments.list_for_season("S01").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_end_round_for_other_round_keeps_game() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    let out = orch
        .handle_control_message(&broadcast("BROADCAST_END_LEAGUE_ROUND", "b-end2", json!({"round_number": 2})))
        .await;
    assert!(out.is_empty());
    assert!(orch.active_game().is_some());
}

#[tokio::test]
async fn test_end_season_aborts_and_completes() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    let out = orch
        .handle_control_message(&broadcast("BROADCAST_END_SEASON", "b-end", json!({})))
        .await;

    assert_eq!(types(&out), vec![MessageType::MatchResultReport]);
    assert_eq!(out[0].envelope.payload_str("abort_reason"), Some("season ended"));
    assert_eq!(orch.state(), SeasonState::Completed);
    let season = orch.repos.seasons.find_by_id("S01").await.unwrap().unwrap();
    assert_eq!(season.status, referee_core::SeasonStatus::Completed);
}

#[tokio::test]
async fn test_context_game_id_falls_back_to_placeholders() {
    let orch = registered(Arc::new(TestAi::default())).await;
    let keep_alive = broadcast("BROADCAST_KEEP_ALIVE", "b-ka", json!({}));
    assert_eq!(orch.context_game_id(&keep_alive).await, "0199999");
    assert_eq!(orch.context_game_id(&new_round("b-r1", 1)).await, "0101001");
    assert_eq!(orch.context_game_id(&new_round("b-r3", 3)).await, "0103999");
}

#[tokio::test]
async fn test_expired_player_deadline_aborts_game() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    assert!(orch.check_timeouts().await.is_empty());

    orch.deadlines.set(DeadlinePhase::Warmup, "p1@test.com", 0);
    let out = orch.check_timeouts().await;
    assert_eq!(types(&out), vec![MessageType::MatchResultReport]);
    assert_eq!(
        out[0].envelope.payload_str("abort_reason"),
        Some("timeout: warmup deadline expired for p1@test.com")
    );
    assert_eq!(orch.state(), SeasonState::Running);
    assert!(orch.deadlines().is_empty());
}

#[tokio::test]
async fn test_reply_clears_sender_deadline() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;
    orch.route_player_message(&player("Q21WARMUPRESPONSE", "P1@Test.com", json!({"answer": "4"})))
        .await
        .unwrap();
    assert!(orch.deadlines().phase_for("p1@test.com").is_none());
    assert_eq!(orch.deadlines().phase_for("p2@test.com"), Some(DeadlinePhase::Warmup));
}

#[tokio::test]
async fn test_rejected_reply_keeps_sender_deadline() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    orch.handle_control_message(&new_round("b-r1", 1)).await;

    let mut stale = player("Q21WARMUPRESPONSE", "p1@test.com", json!({"answer": "4"}));
    stale["game_id"] = json!("0199001");
    let err = orch.route_player_message(&stale).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::GameMismatch { .. }));
    assert_eq!(orch.deadlines().phase_for("p1@test.com"), Some(DeadlinePhase::Warmup));

    // Out-of-phase message for the right game.
    let early = player("Q21GUESSSUBMISSION", "p1@test.com", json!({"confidence": 0.5}));
    orch.route_player_message(&early).await.unwrap();
    assert_eq!(orch.deadlines().phase_for("p1@test.com"), Some(DeadlinePhase::Warmup));

    orch.deadlines.set(DeadlinePhase::Warmup, "p1@test.com", 0);
    let out = orch.check_timeouts().await;
    assert_eq!(types(&out), vec![MessageType::MatchResultReport]);
}

#[tokio::test]
async fn test_round_results_are_logged_without_reply() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    let results = broadcast(
        "BROADCAST_ROUND_RESULTS",
        "b-results",
        json!({
            "round_number": 1,
            "results": [
                {"match_id": "0101001", "winner_id": "P1"},
                {"match_id": "0101002", "winner_id": null},
            ],
            "standings": [{"participant_id": "P1"}, {"participant_id": "P2"}],
        }),
    );
    assert!(orch.handle_control_message(&results).await.is_empty());
    assert_eq!(orch.state(), SeasonState::Running);
}

#[tokio::test]
async fn test_oversized_round_number_is_not_truncated() {
    let mut orch = registered(Arc::new(TestAi::default())).await;
    // Truncated to u32 this would be round 1.
    let huge = u64::from(u32::MAX) + 2;
    let round = broadcast(
        "BROADCAST_NEW_LEAGUE_ROUND",
        "b-huge",
        json!({"round_id": "ROUND_X", "round_number": huge}),
    );
    assert!(orch.handle_control_message(&round).await.is_empty());
    assert!(orch.active_game().is_none());
    assert_eq!(orch.context_game_id(&round).await, "0199999");

    orch.handle_control_message(&new_round("b-r1", 1)).await;
    let end = broadcast("BROADCAST_END_LEAGUE_ROUND", "b-end-huge", json!({"round_number": huge}));
    assert!(orch.handle_control_message(&end).await.is_empty());
    assert!(orch.active_game().is_some());
}
