use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Protocol identifier carried by every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "league.v2")]
    League,
    #[serde(rename = "Q21G.v1")]
    Q21,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::League => "league.v2",
            Self::Q21 => "Q21G.v1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "league.v2" => Some(Self::League),
            "Q21G.v1" => Some(Self::Q21),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Player,
    Referee,
    #[serde(rename = "LEAGUEMANAGER")]
    LeagueManager,
}

impl Role {
    pub const ALL: [&'static str; 3] = ["PLAYER", "REFEREE", "LEAGUEMANAGER"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "PLAYER",
            Self::Referee => "REFEREE",
            Self::LeagueManager => "LEAGUEMANAGER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub logical_id: Option<String>,
}

/// The uniform wire structure wrapping every protocol message.
///
/// Context fields are independently optional. `None` is omitted from the
/// serialized form, while `Some("")` is written out, so an empty value
/// survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub protocol: Protocol,
    pub message_type: String,
    pub message_id: String,
    pub timestamp: String,
    pub sender: Sender,
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn payload_u64(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }

    /// Like [`payload_u64`](Self::payload_u64), but `None` when the value
    /// does not fit in a `u32`.
    pub fn payload_u32(&self, key: &str) -> Option<u32> {
        self.payload_u64(key).and_then(|n| u32::try_from(n).ok())
    }

    /// Dedup key for broadcasts: `payload.broadcast_id`, else the message id.
    pub fn broadcast_id(&self) -> &str {
        self.payload_str("broadcast_id")
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.message_id)
    }
}

/// Wire timestamp, e.g. `2026-01-05T10:00:00.123456+00:00`.
pub fn wire_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Message id of the form `{prefix}-{8 hex}`.
pub fn message_id(prefix: &str) -> String {
    format!("{prefix}-{}", short_hex())
}

pub fn short_hex() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
