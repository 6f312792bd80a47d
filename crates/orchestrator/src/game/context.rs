use referee_core::{GameState, PlayerGuess, PlayerState, Question};

use crate::callbacks::{
    AnswersContext, AnswersDynamic, BookInfo, CallbackContext, CallbackKind, GameContext,
    PlayerInfo, RoundStartContext, RoundStartDynamic, ScoreContext, ScoreDynamic, WarmupContext,
    WarmupDynamic,
};
use crate::executor::CallbackExecutor;

/// Referee-level values copied into every callback context.
#[derive(Debug, Clone, Default)]
pub struct RefereeContext {
    pub referee_id: String,
    pub assignment_table_id: Option<String>,
    pub actual_opening_sentence: Option<String>,
    pub actual_associative_word: Option<String>,
}

/// Builds callback inputs from the live game state.
#[derive(Debug, Clone)]
pub(crate) struct ContextBuilder<'a> {
    pub referee: &'a RefereeContext,
    pub executor: &'a CallbackExecutor,
    pub state: &'a GameState,
}

impl<'a> ContextBuilder<'a> {
    fn game(&self) -> GameContext {
        GameContext {
            season_id: self.state.season_id.clone(),
            league_id: self.state.league_id.clone(),
            game_id: self.state.game_id.clone(),
            match_id: self.state.match_id.clone(),
            referee_id: self.referee.referee_id.clone(),
            round_number: self.state.round_number,
            round_id: self.state.round_id.clone(),
            assignment_table_id: self.referee.assignment_table_id.clone(),
        }
    }

    fn book(&self) -> BookInfo {
        BookInfo {
            book_name: self.state.book_name.clone(),
            book_hint: self.state.book_hint.clone(),
            association_word: self.state.association_word.clone(),
        }
    }

    fn player_info(player: Option<&PlayerState>, with_warmup: bool) -> PlayerInfo {
        match player {
            Some(p) => PlayerInfo {
                id: Some(p.participant_id.clone()),
                email: Some(p.email.clone()),
                warmup_answer: if with_warmup {
                    p.warmup_answer.clone()
                } else {
                    None
                },
            },
            None => PlayerInfo::default(),
        }
    }

    fn wrap<D>(&self, kind: CallbackKind, dynamic: D) -> CallbackContext<D> {
        CallbackContext {
            dynamic,
            service: self.executor.service(kind),
        }
    }

    pub fn warmup(&self) -> WarmupContext {
        self.wrap(
            CallbackKind::WarmupQuestion,
            WarmupDynamic {
                game: self.game(),
                player_a: Self::player_info(self.state.player1.as_ref(), false),
                player_b: Self::player_info(self.state.player2.as_ref(), false),
            },
        )
    }

    pub fn round_start(&self) -> RoundStartContext {
        self.wrap(
            CallbackKind::RoundStartInfo,
            RoundStartDynamic {
                game: self.game(),
                player_a: Self::player_info(self.state.player1.as_ref(), true),
                player_b: Self::player_info(self.state.player2.as_ref(), true),
            },
        )
    }

    pub fn answers(&self, player: &PlayerState, questions: Vec<Question>) -> AnswersContext {
        self.wrap(
            CallbackKind::Answers,
            AnswersDynamic {
                game: self.game(),
                player_id: player.participant_id.clone(),
                player_email: player.email.clone(),
                book: self.book(),
                questions,
            },
        )
    }

    pub fn score(&self, player: &PlayerState, guess: PlayerGuess) -> ScoreContext {
        self.wrap(
            CallbackKind::ScoreFeedback,
            ScoreDynamic {
                game: self.game(),
                player_id: player.participant_id.clone(),
                player_email: player.email.clone(),
                book: self.book(),
                actual_opening_sentence: self.referee.actual_opening_sentence.clone(),
                actual_associative_word: self.referee.actual_associative_word.clone(),
                player_guess: guess,
            },
        )
    }
}
