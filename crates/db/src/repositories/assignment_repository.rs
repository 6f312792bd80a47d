use crate::error::DbError;
use crate::models::AssignmentRow;
use chrono::Utc;
use referee_core::{AssignmentStatus, RoundAssignment};
use sqlx::SqlitePool;

const SELECT_COLUMNS: &str = r#"
    SELECT season_id, round_number, round_id, match_id, game_id, group_id,
           player1_id, player1_email, player2_id, player2_email, status
    FROM round_assignments
"#;

/// Round assignments handed to this referee, keyed by season and match.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    /// Create a repository over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores an assignment, replacing any earlier copy of the same match.
    pub async fn upsert(&self, assignment: &RoundAssignment) -> Result<(), DbError> {
        let row = AssignmentRow::from(assignment);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO round_assignments
                (season_id, round_number, round_id, match_id, game_id, group_id,
                 player1_id, player1_email, player2_id, player2_email, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.season_id)
        .bind(row.round_number)
        .bind(&row.round_id)
        .bind(&row.match_id)
        .bind(&row.game_id)
        .bind(&row.group_id)
        .bind(&row.player1_id)
        .bind(&row.player1_email)
        .bind(&row.player2_id)
        .bind(&row.player2_email)
        .bind(&row.status)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// This referee's game for a round, if it has one.
    pub async fn find_by_round(
        &self,
        season_id: &str,
        round_number: u32,
    ) -> Result<Option<RoundAssignment>, DbError> {
        let row: Option<AssignmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE season_id = ? AND round_number = ? ORDER BY match_id LIMIT 1"
        ))
        .bind(season_id)
        .bind(i64::from(round_number))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// Find the assignment for one match of a season
    pub async fn find_by_match(
        &self,
        season_id: &str,
        match_id: &str,
    ) -> Result<Option<RoundAssignment>, DbError> {
        let row: Option<AssignmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE season_id = ? AND match_id = ?"
        ))
        .bind(season_id)
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// All assignments of a season, ordered by round
    pub async fn list_for_season(&self, season_id: &str) -> Result<Vec<RoundAssignment>, DbError> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE season_id = ? ORDER BY round_number, match_id"
        ))
        .bind(season_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    /// Records the league's round id and moves the assignment to `status`.
    pub async fn update_status(
        &self,
        season_id: &str,
        match_id: &str,
        status: AssignmentStatus,
        round_id: Option<&str>,
    ) -> Result<(), DbError> {
        let completed_at = (status == AssignmentStatus::Completed).then(|| Utc::now().timestamp());

        let result = sqlx::query(
            r#"
            UPDATE round_assignments
            SET status = ?,
                round_id = COALESCE(?, round_id),
                completed_at = COALESCE(?, completed_at)
            WHERE season_id = ? AND match_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(round_id)
        .bind(completed_at)
        .bind(season_id)
        .bind(match_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::AssignmentNotFound {
                season_id: season_id.to_string(),
                match_id: match_id.to_string(),
            });
        }
        Ok(())
    }

    /// Drops every assignment; used on a league-wide reset.
    pub async fn clear(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM round_assignments")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
