use crate::error::DbError;
use crate::models::SeasonRow;
use chrono::Utc;
use referee_core::{Season, SeasonStatus};
use sqlx::SqlitePool;

/// Seasons this referee has taken part in and their registration status.
#[derive(Clone)]
pub struct SeasonRepository {
    pool: SqlitePool,
}

impl SeasonRepository {
    /// Create a repository over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the season, or refreshes league and status when it exists.
    pub async fn upsert(&self, season: &Season) -> Result<(), DbError> {
        let row = SeasonRow::from(season);

        sqlx::query(
            r#"
            INSERT INTO referee_seasons (season_id, league_id, status, created_at, registered_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(season_id) DO UPDATE SET
                league_id = excluded.league_id,
                status = excluded.status,
                registered_at = excluded.registered_at,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(&row.season_id)
        .bind(&row.league_id)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.registered_at)
        .bind(row.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a season by id
    pub async fn find_by_id(&self, season_id: &str) -> Result<Option<Season>, DbError> {
        let row: Option<SeasonRow> = sqlx::query_as(
            r#"
            SELECT season_id, league_id, status, created_at, registered_at, completed_at
            FROM referee_seasons
            WHERE season_id = ?
            "#,
        )
        .bind(season_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// All known seasons
    pub async fn find_all(&self) -> Result<Vec<Season>, DbError> {
        let rows: Vec<SeasonRow> = sqlx::query_as(
            r#"
            SELECT season_id, league_id, status, created_at, registered_at, completed_at
            FROM referee_seasons
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    /// Moves a season to `status`, stamping the matching timestamp.
    pub async fn update_status(
        &self,
        season_id: &str,
        status: SeasonStatus,
    ) -> Result<Season, DbError> {
        let Some(mut season) = self.find_by_id(season_id).await? else {
            return Err(DbError::SeasonNotFound(season_id.to_string()));
        };

        match status {
            SeasonStatus::Registered => season.register(),
            SeasonStatus::Completed => season.complete(),
            SeasonStatus::Rejected => season.reject(),
            other => season.status = other,
        }
        if season.status == SeasonStatus::Active && season.registered_at.is_none() {
            season.registered_at = Some(Utc::now());
        }

        self.upsert(&season).await?;
        Ok(season)
    }
}
