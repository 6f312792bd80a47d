#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use orchestrator::callbacks::{AnswersContext, RoundStartContext, ScoreContext, WarmupContext};
use orchestrator::{
    AnswersOutput, BookInfo, RawMessage, RefereeAi, RefereeConfig, RefereeRunner, RoundStartInfo,
    ScoreOutput, SeasonOrchestrator, Transport, WarmupQuestion,
};
use protocol::{Envelope, MessageType};
use referee_core::{Answer, Feedback, ScoreBreakdown};
use serde_json::{json, Value};

pub const LM: &str = "lm@league.test";
pub const REFEREE: &str = "ref@league.test";
pub const ALICE: &str = "alice@players.test";
pub const BOB: &str = "bob@players.test";
pub const GAME: &str = "0101001";

/// Decision module with fixed outputs; the first player in the game
/// (`ALICE`) always wins the scoring.
#[derive(Default)]
pub struct ScriptedAi {
    pub fail_warmup: bool,
    pub score_calls: AtomicUsize,
}

impl ScriptedAi {
    pub fn score_calls(&self) -> usize {
        self.score_calls.load(Ordering::SeqCst)
    }
}

impl RefereeAi for ScriptedAi {
    fn warmup_question(&self, _ctx: &WarmupContext) -> anyhow::Result<WarmupQuestion> {
        if self.fail_warmup {
            return Err(anyhow!("question bank offline"));
        }
        Ok(WarmupQuestion::new("How many legs does a spider have?"))
    }

    fn round_start_info(&self, _ctx: &RoundStartContext) -> anyhow::Result<RoundStartInfo> {
        Ok(BookInfo {
            book_name: "Moby Dick".into(),
            book_hint: "A captain hunts a white whale".into(),
            association_word: "sea".into(),
        })
    }

    fn answers(&self, ctx: &AnswersContext) -> anyhow::Result<AnswersOutput> {
        Ok(AnswersOutput::new(
            ctx.dynamic
                .questions
                .iter()
                .map(|q| Answer::new(q.question_number, "A"))
                .collect(),
        ))
    }

    fn score_feedback(&self, ctx: &ScoreContext) -> anyhow::Result<ScoreOutput> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        let points = if ctx.dynamic.player_email == ALICE { 3 } else { 1 };
        let text = vec!["insight"; 170].join(" ");
        Ok(ScoreOutput {
            league_points: points,
            private_score: 25.0 * f64::from(points),
            breakdown: ScoreBreakdown::default(),
            feedback: Some(Feedback {
                opening_sentence: text.clone(),
                associative_word: text,
            }),
        })
    }
}

/// Transport backed by in-memory queues.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub inbox: VecDeque<RawMessage>,
    pub sent: Vec<(String, Envelope)>,
    /// Number of upcoming sends to refuse.
    pub refuse_next: usize,
    pub refused: usize,
}

impl MemoryTransport {
    pub fn push(&mut self, from: &str, body: Value) {
        self.inbox.push_back(RawMessage::new(from, "", body));
    }

    pub fn take_sent(&mut self) -> Vec<(String, Envelope)> {
        std::mem::take(&mut self.sent)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn poll(&mut self) -> orchestrator::Result<Vec<RawMessage>> {
        Ok(self.inbox.drain(..).collect())
    }

    async fn send(
        &mut self,
        recipient: &str,
        _subject: &str,
        envelope: &Envelope,
    ) -> orchestrator::Result<bool> {
        if self.refuse_next > 0 {
            self.refuse_next -= 1;
            self.refused += 1;
            return Ok(false);
        }
        self.sent.push((recipient.to_string(), envelope.clone()));
        Ok(true)
    }
}

pub async fn runner(ai: Arc<ScriptedAi>) -> RefereeRunner<MemoryTransport> {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let config = RefereeConfig::new("REF01", REFEREE)
        .with_group("GREF")
        .with_league("LEAGUE1", "S01")
        .with_league_manager(LM);
    let orchestrator = SeasonOrchestrator::new(config, ai, pool).await.unwrap();
    RefereeRunner::new(orchestrator, MemoryTransport::default())
        .with_retry_delay(std::time::Duration::ZERO)
}

/// Feeds `messages` through one runner iteration and returns what was sent.
pub async fn step(
    runner: &mut RefereeRunner<MemoryTransport>,
    messages: Vec<(&str, Value)>,
) -> Vec<(String, Envelope)> {
    for (from, body) in messages {
        runner.transport_mut().push(from, body);
    }
    runner.run_once().await.unwrap();
    runner.transport_mut().take_sent()
}

pub fn types(sent: &[(String, Envelope)]) -> Vec<MessageType> {
    sent.iter()
        .filter_map(|(_, e)| MessageType::parse(&e.message_type))
        .collect()
}

pub fn league(message_type: &str, message_id: &str, payload: Value) -> Value {
    json!({
        "protocol": "league.v2",
        "message_type": message_type,
        "message_id": message_id,
        "timestamp": "2026-01-05T10:00:00.000000+00:00",
        "sender": {"email": LM, "role": "LEAGUEMANAGER", "logical_id": "LM01"},
        "recipient_id": "REF01",
        "league_id": "LEAGUE1",
        "season_id": "S01",
        "payload": payload,
    })
}

pub fn start_season() -> Value {
    league(
        "BROADCAST_START_SEASON",
        "start-1",
        json!({
            "broadcast_id": "b-start",
            "season_id": "S01",
            "season_name": "Autumn",
            "game_type": "Q21",
            "total_rounds": 3,
            "registration_deadline": "2026-01-06T10:00:00+00:00",
        }),
    )
}

pub fn registration_accepted() -> Value {
    league(
        "SEASON_REGISTRATION_RESPONSE",
        "reg-1",
        json!({"status": "accepted"}),
    )
}

fn entries(game_id: &str, referee: &str, p1: (&str, &str), p2: (&str, &str)) -> Vec<Value> {
    vec![
        json!({"role": "referee", "email": referee, "game_id": game_id, "group_id": "GREF"}),
        json!({"role": "player1", "email": p1.1, "game_id": game_id, "group_id": p1.0}),
        json!({"role": "player2", "email": p2.1, "game_id": game_id, "group_id": p2.0}),
    ]
}

/// Rounds 1 and 2 for this referee (Alice v Bob), plus a game refereed
/// by someone else.
pub fn assignment_table(broadcast_id: &str) -> Value {
    let mut assignments = entries(GAME, REFEREE, ("PA", ALICE), ("PB", BOB));
    assignments.extend(entries("0102001", REFEREE, ("PA", ALICE), ("PB", BOB)));
    let mut other = entries("0101002", "other@league.test", ("PC", "c@p.test"), ("PD", "d@p.test"));
    for entry in &mut other {
        entry["group_id"] = json!("GX");
    }
    assignments.extend(other);
    league(
        "BROADCAST_ASSIGNMENT_TABLE",
        &format!("msg-{broadcast_id}"),
        json!({
            "broadcast_id": broadcast_id,
            "season_id": "S01",
            "league_id": "LEAGUE1",
            "total_count": 3,
            "assignments": assignments,
        }),
    )
}

pub fn new_round(round: u32, lookup: Option<Vec<&str>>) -> Value {
    let mut payload = json!({
        "broadcast_id": format!("b-round-{round}"),
        "round_id": format!("ROUND_{round}"),
        "round_number": round,
    });
    if let Some(table) = lookup {
        payload["participant_lookup_table"] = json!(table);
    }
    league("BROADCAST_NEW_LEAGUE_ROUND", &format!("round-{round}"), payload)
}

pub fn end_round(round: u32) -> Value {
    league(
        "BROADCAST_END_LEAGUE_ROUND",
        &format!("end-round-{round}"),
        json!({"broadcast_id": format!("b-end-{round}"), "round_number": round}),
    )
}

pub fn player(message_type: &str, sender: &str, game_id: &str, payload: Value) -> Value {
    json!({
        "protocol": "Q21G.v1",
        "message_type": message_type,
        "message_id": format!("{message_type}-{sender}"),
        "timestamp": "2026-01-05T10:01:00.000000+00:00",
        "sender": {"email": sender, "role": "PLAYER"},
        "recipient_id": "REF01",
        "game_id": game_id,
        "payload": payload,
    })
}

pub fn warmup_response(sender: &str, game_id: &str) -> Value {
    player("Q21WARMUPRESPONSE", sender, game_id, json!({"answer": "8"}))
}

pub fn questions_batch(sender: &str, game_id: &str) -> Value {
    let questions: Vec<Value> = (1..=20)
        .map(|n| {
            json!({
                "question_number": n,
                "question_text": format!("Is the hint about chapter {n}?"),
                "options": {"A": "yes", "B": "no", "C": "maybe", "D": "unclear"},
            })
        })
        .collect();
    player("Q21QUESTIONSBATCH", sender, game_id, json!({"questions": questions}))
}

pub fn guess(sender: &str, game_id: &str) -> Value {
    player(
        "Q21GUESSSUBMISSION",
        sender,
        game_id,
        json!({
            "opening_sentence": "Call me Ishmael.",
            "sentence_justification": "Famous first line.",
            "associative_word": "ocean",
            "word_justification": "Whales live there.",
            "confidence": 0.9,
        }),
    )
}

/// Registers, receives the table and returns the runner in RUNNING.
pub async fn registered_runner(ai: Arc<ScriptedAi>) -> RefereeRunner<MemoryTransport> {
    let mut runner = runner(ai).await;
    step(
        &mut runner,
        vec![
            (LM, start_season()),
            (LM, registration_accepted()),
            (LM, assignment_table("b-table")),
        ],
    )
    .await;
    runner
}
