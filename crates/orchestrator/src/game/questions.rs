use protocol::{OutgoingMessage, PlayerMessage};
use referee_core::{GamePhase, Question};
use serde_json::Value;
use tracing::{info, warn};

use super::GameEngine;

impl GameEngine {
    /// Answers one player's question batch.
    pub(super) async fn on_questions(&mut self, message: &PlayerMessage) -> Vec<OutgoingMessage> {
        let Some(slot) = self.admit(message) else {
            return Vec::new();
        };

        let raw = message.payload.get("questions").cloned().unwrap_or(Value::Null);
        let questions: Vec<Question> = match serde_json::from_value(raw) {
            Ok(questions) => questions,
            Err(e) => {
                warn!(
                    game_id = %self.state.game_id,
                    sender = %message.sender_email,
                    error = %e,
                    "Malformed questions batch"
                );
                return Vec::new();
            }
        };

        let Some(player) = self.player_mut(slot) else {
            return Vec::new();
        };
        player.questions = Some(questions.clone());
        player.questions_message_id = message.message_id.clone();
        let player = player.clone();

        let ctx = self.contexts().answers(&player, questions);
        let answers = match self.setup.executor.answers(ctx).await {
            Ok(answers) => answers,
            Err(e) => {
                warn!(
                    game_id = %self.state.game_id,
                    participant = %player.participant_id,
                    error = %e,
                    "Answers callback failed, player stalled"
                );
                return Vec::new();
            }
        };

        let outgoing = self.setup.envelopes.answers_batch(
            &self.state,
            &player,
            &answers,
            message.message_id.clone(),
        );
        if let Some(player) = self.player_mut(slot) {
            player.answers_sent = true;
        }

        let next = if self.state.all_answers_sent() {
            GamePhase::AnswersSent
        } else {
            GamePhase::QuestionsCollecting
        };
        self.state.advance_phase(next);
        info!(
            game_id = %self.state.game_id,
            participant = %player.participant_id,
            answers = answers.len(),
            phase = ?next,
            "Answers sent"
        );
        vec![outgoing]
    }
}
