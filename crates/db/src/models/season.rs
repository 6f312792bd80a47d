use referee_core::{Season, SeasonStatus};

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonRow {
    pub season_id: String,
    pub league_id: String,
    pub status: String,
    pub created_at: i64,
    pub registered_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl SeasonRow {
    pub fn into_domain(self) -> Season {
        Season {
            season_id: self.season_id,
            league_id: self.league_id,
            status: SeasonStatus::parse(&self.status).unwrap_or_default(),
            created_at: timestamp_to_datetime(self.created_at),
            registered_at: self.registered_at.map(timestamp_to_datetime),
            completed_at: self.completed_at.map(timestamp_to_datetime),
        }
    }
}

impl From<&Season> for SeasonRow {
    fn from(season: &Season) -> Self {
        Self {
            season_id: season.season_id.clone(),
            league_id: season.league_id.clone(),
            status: season.status.as_str().to_string(),
            created_at: datetime_to_timestamp(season.created_at),
            registered_at: season.registered_at.map(datetime_to_timestamp),
            completed_at: season.completed_at.map(datetime_to_timestamp),
        }
    }
}
