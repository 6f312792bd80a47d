use crate::error::DbError;
use crate::models::MatchResultRow;
use referee_core::MatchResult;
use sqlx::SqlitePool;

/// Final results of the games this referee reported.
#[derive(Clone)]
pub struct MatchResultRepository {
    pool: SqlitePool,
}

impl MatchResultRepository {
    /// Create a repository over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a reported result. A second report for the same match is
    /// ignored; returns whether this one was stored.
    pub async fn save(&self, result: &MatchResult) -> Result<bool, DbError> {
        let row = MatchResultRow::from(result);

        let outcome = sqlx::query(
            r#"
            INSERT OR IGNORE INTO match_results
                (season_id, round_id, match_id, game_id, status, winner_id, is_draw,
                 player1_id, player1_email, player1_points, player1_score,
                 player2_id, player2_email, player2_points, player2_score,
                 abort_reason, completed_at, reported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.season_id)
        .bind(&row.round_id)
        .bind(&row.match_id)
        .bind(&row.game_id)
        .bind(&row.status)
        .bind(&row.winner_id)
        .bind(row.is_draw)
        .bind(&row.player1_id)
        .bind(&row.player1_email)
        .bind(row.player1_points)
        .bind(row.player1_score)
        .bind(&row.player2_id)
        .bind(&row.player2_email)
        .bind(row.player2_points)
        .bind(row.player2_score)
        .bind(&row.abort_reason)
        .bind(row.completed_at)
        .bind(row.reported_at)
        .execute(&self.pool)
        .await?;

        Ok(outcome.rows_affected() > 0)
    }

    /// Find the stored result of one match
    pub async fn find_by_match(
        &self,
        season_id: &str,
        match_id: &str,
    ) -> Result<Option<MatchResult>, DbError> {
        let row: Option<MatchResultRow> = sqlx::query_as(
            r#"
            SELECT * FROM match_results
            WHERE season_id = ? AND match_id = ?
            "#,
        )
        .bind(season_id)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// All results stored for a season
    pub async fn list_for_season(&self, season_id: &str) -> Result<Vec<MatchResult>, DbError> {
        let rows: Vec<MatchResultRow> = sqlx::query_as(
            r#"
            SELECT * FROM match_results
            WHERE season_id = ?
            ORDER BY completed_at, match_id
            "#,
        )
        .bind(season_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}
