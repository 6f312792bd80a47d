use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Season-level placeholder used when no round or game is in context.
pub const SEASON_PLACEHOLDER_GAME_ID: &str = "0199999";

/// Structured `SSRRGGG` game identifier: two digits of season, two of
/// round, three of game-within-round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameId {
    pub season: u8,
    pub round: u8,
    pub game: u16,
}

impl GameId {
    pub fn new(season: u8, round: u8, game: u16) -> Self {
        Self {
            season,
            round,
            game,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        if value.len() != 7 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_game_id(value, "expected 7 digits (SSRRGGG)"));
        }
        let number = |range: std::ops::Range<usize>| -> Result<u16> {
            value[range]
                .parse::<u16>()
                .map_err(|e| CoreError::invalid_game_id(value, e.to_string()))
        };
        Ok(Self {
            season: number(0..2)? as u8,
            round: number(2..4)? as u8,
            game: number(4..7)?,
        })
    }

    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_ok()
    }

    /// Round number encoded in the RR segment of a raw game id.
    pub fn round_of(value: &str) -> Option<u32> {
        Self::parse(value).ok().map(|id| u32::from(id.round))
    }

    /// Placeholder for a round in which this referee has no game.
    pub fn round_placeholder(round_number: u32) -> String {
        format!("01{:02}999", round_number % 100)
    }

    pub fn is_placeholder(&self) -> bool {
        self.game == 999
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:03}", self.season, self.round, self.game)
    }
}

impl TryFrom<String> for GameId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.to_string()
    }
}
