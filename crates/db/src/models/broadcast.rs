use chrono::{DateTime, Utc};

use super::timestamp_to_datetime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    pub broadcast_id: String,
    pub message_type: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BroadcastRow {
    pub broadcast_id: String,
    pub message_type: String,
    pub received_at: i64,
}

impl BroadcastRow {
    pub fn into_domain(self) -> BroadcastRecord {
        BroadcastRecord {
            broadcast_id: self.broadcast_id,
            message_type: self.message_type,
            received_at: timestamp_to_datetime(self.received_at),
        }
    }
}
