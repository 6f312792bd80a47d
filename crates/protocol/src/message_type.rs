use serde::{Deserialize, Serialize};

use crate::envelope::Protocol;

/// Who sends a message type to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LeagueToAll,
    LeagueToParticipant,
    ParticipantToLeague,
    RefereeToLeague,
    RefereeToPlayer,
    PlayerToReferee,
    Any,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeagueToAll => "LM→All",
            Self::LeagueToParticipant => "LM→Player/Referee",
            Self::ParticipantToLeague => "Player/Referee→LM",
            Self::RefereeToLeague => "Referee→LM",
            Self::RefereeToPlayer => "Referee→Player",
            Self::PlayerToReferee => "Player→Referee",
            Self::Any => "Any",
        }
    }
}

/// Closed set of message types understood by the referee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageType {
    BroadcastStartSeason,
    SeasonRegistrationRequest,
    SeasonRegistrationResponse,
    BroadcastAssignmentTable,
    ResponseGroupAssignment,
    BroadcastNewLeagueRound,
    BroadcastEndLeagueRound,
    BroadcastEndSeason,
    BroadcastKeepAlive,
    ResponseKeepAlive,
    BroadcastCriticalPause,
    BroadcastCriticalContinue,
    BroadcastCriticalReset,
    BroadcastRoundResults,
    MatchResultReport,
    LeagueCompleted,
    ErrorResponse,
    Q21WarmupCall,
    Q21WarmupResponse,
    Q21RoundStart,
    Q21QuestionsBatch,
    Q21AnswersBatch,
    Q21GuessSubmission,
    Q21ScoreFeedback,
}

impl MessageType {
    pub const ALL: [MessageType; 24] = [
        Self::BroadcastStartSeason,
        Self::SeasonRegistrationRequest,
        Self::SeasonRegistrationResponse,
        Self::BroadcastAssignmentTable,
        Self::ResponseGroupAssignment,
        Self::BroadcastNewLeagueRound,
        Self::BroadcastEndLeagueRound,
        Self::BroadcastEndSeason,
        Self::BroadcastKeepAlive,
        Self::ResponseKeepAlive,
        Self::BroadcastCriticalPause,
        Self::BroadcastCriticalContinue,
        Self::BroadcastCriticalReset,
        Self::BroadcastRoundResults,
        Self::MatchResultReport,
        Self::LeagueCompleted,
        Self::ErrorResponse,
        Self::Q21WarmupCall,
        Self::Q21WarmupResponse,
        Self::Q21RoundStart,
        Self::Q21QuestionsBatch,
        Self::Q21AnswersBatch,
        Self::Q21GuessSubmission,
        Self::Q21ScoreFeedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BroadcastStartSeason => "BROADCAST_START_SEASON",
            Self::SeasonRegistrationRequest => "SEASON_REGISTRATION_REQUEST",
            Self::SeasonRegistrationResponse => "SEASON_REGISTRATION_RESPONSE",
            Self::BroadcastAssignmentTable => "BROADCAST_ASSIGNMENT_TABLE",
            Self::ResponseGroupAssignment => "RESPONSE_GROUP_ASSIGNMENT",
            Self::BroadcastNewLeagueRound => "BROADCAST_NEW_LEAGUE_ROUND",
            Self::BroadcastEndLeagueRound => "BROADCAST_END_LEAGUE_ROUND",
            Self::BroadcastEndSeason => "BROADCAST_END_SEASON",
            Self::BroadcastKeepAlive => "BROADCAST_KEEP_ALIVE",
            Self::ResponseKeepAlive => "RESPONSE_KEEP_ALIVE",
            Self::BroadcastCriticalPause => "BROADCAST_CRITICAL_PAUSE",
            Self::BroadcastCriticalContinue => "BROADCAST_CRITICAL_CONTINUE",
            Self::BroadcastCriticalReset => "BROADCAST_CRITICAL_RESET",
            Self::BroadcastRoundResults => "BROADCAST_ROUND_RESULTS",
            Self::MatchResultReport => "MATCH_RESULT_REPORT",
            Self::LeagueCompleted => "LEAGUE_COMPLETED",
            Self::ErrorResponse => "ERROR_RESPONSE",
            Self::Q21WarmupCall => "Q21WARMUPCALL",
            Self::Q21WarmupResponse => "Q21WARMUPRESPONSE",
            Self::Q21RoundStart => "Q21ROUNDSTART",
            Self::Q21QuestionsBatch => "Q21QUESTIONSBATCH",
            Self::Q21AnswersBatch => "Q21ANSWERSBATCH",
            Self::Q21GuessSubmission => "Q21GUESSSUBMISSION",
            Self::Q21ScoreFeedback => "Q21SCOREFEEDBACK",
        }
    }

    /// Resolves a wire name. Player message types are also accepted in
    /// their underscored spelling (`Q21_WARMUP_RESPONSE`).
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(found) = Self::ALL.iter().find(|t| t.as_str() == s) {
            return Some(*found);
        }
        match s {
            "Q21_WARMUP_CALL" => Some(Self::Q21WarmupCall),
            "Q21_WARMUP_RESPONSE" => Some(Self::Q21WarmupResponse),
            "Q21_ROUND_START" => Some(Self::Q21RoundStart),
            "Q21_QUESTIONS_BATCH" => Some(Self::Q21QuestionsBatch),
            "Q21_ANSWERS_BATCH" => Some(Self::Q21AnswersBatch),
            "Q21_GUESS_SUBMISSION" => Some(Self::Q21GuessSubmission),
            "Q21_SCORE_FEEDBACK" => Some(Self::Q21ScoreFeedback),
            _ => None,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Q21WarmupCall
            | Self::Q21WarmupResponse
            | Self::Q21RoundStart
            | Self::Q21QuestionsBatch
            | Self::Q21AnswersBatch
            | Self::Q21GuessSubmission
            | Self::Q21ScoreFeedback => Protocol::Q21,
            _ => Protocol::League,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::BroadcastStartSeason
            | Self::BroadcastAssignmentTable
            | Self::BroadcastNewLeagueRound
            | Self::BroadcastEndLeagueRound
            | Self::BroadcastEndSeason
            | Self::BroadcastKeepAlive
            | Self::BroadcastCriticalPause
            | Self::BroadcastCriticalContinue
            | Self::BroadcastCriticalReset
            | Self::BroadcastRoundResults
            | Self::LeagueCompleted => Direction::LeagueToAll,
            Self::SeasonRegistrationResponse => Direction::LeagueToParticipant,
            Self::SeasonRegistrationRequest
            | Self::ResponseGroupAssignment
            | Self::ResponseKeepAlive => Direction::ParticipantToLeague,
            Self::MatchResultReport => Direction::RefereeToLeague,
            Self::ErrorResponse => Direction::Any,
            Self::Q21WarmupCall
            | Self::Q21RoundStart
            | Self::Q21AnswersBatch
            | Self::Q21ScoreFeedback => Direction::RefereeToPlayer,
            Self::Q21WarmupResponse | Self::Q21QuestionsBatch | Self::Q21GuessSubmission => {
                Direction::PlayerToReferee
            }
        }
    }

    /// Envelope context fields that must be present and non-empty.
    pub fn required_context(&self) -> &'static [&'static str] {
        match self {
            Self::BroadcastStartSeason | Self::SeasonRegistrationRequest => &["league_id"],
            Self::SeasonRegistrationResponse
            | Self::BroadcastAssignmentTable
            | Self::BroadcastNewLeagueRound
            | Self::LeagueCompleted => &["league_id", "season_id"],
            Self::MatchResultReport => &["league_id", "season_id", "round_id", "game_id"],
            _ if self.protocol() == Protocol::Q21 => &["game_id"],
            _ => &[],
        }
    }

    /// Control messages from the league manager handled at season level.
    pub fn is_league_control(&self) -> bool {
        matches!(
            self.direction(),
            Direction::LeagueToAll | Direction::LeagueToParticipant
        )
    }

    /// Messages a player sends to the referee during a game.
    pub fn is_player_message(&self) -> bool {
        self.direction() == Direction::PlayerToReferee
    }

    /// Season-level messages that carry no round or game context.
    pub fn is_season_level(&self) -> bool {
        matches!(
            self,
            Self::BroadcastStartSeason
                | Self::SeasonRegistrationResponse
                | Self::BroadcastAssignmentTable
                | Self::LeagueCompleted
                | Self::MatchResultReport
        )
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown message type '{value}'"))
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        value.as_str().to_string()
    }
}
