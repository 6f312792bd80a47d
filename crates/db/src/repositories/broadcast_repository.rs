use crate::error::DbError;
use crate::models::{BroadcastRecord, BroadcastRow};
use chrono::Utc;
use sqlx::SqlitePool;

/// Idempotency ledger: a broadcast id, once recorded, is never processed
/// again.
#[derive(Clone)]
pub struct BroadcastRepository {
    pool: SqlitePool,
}

impl BroadcastRepository {
    /// Create a repository over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns `true` when the id was new.
    pub async fn record(&self, broadcast_id: &str, message_type: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO broadcasts_received (broadcast_id, message_type, received_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(broadcast_id)
        .bind(message_type)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the broadcast id has already been recorded
    pub async fn exists(&self, broadcast_id: &str) -> Result<bool, DbError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM broadcasts_received WHERE broadcast_id = ?")
                .bind(broadcast_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    /// Fetch the ledger entry for a broadcast id
    pub async fn find_by_id(&self, broadcast_id: &str) -> Result<Option<BroadcastRecord>, DbError> {
        let row: Option<BroadcastRow> = sqlx::query_as(
            r#"
            SELECT broadcast_id, message_type, received_at
            FROM broadcasts_received
            WHERE broadcast_id = ?
            "#,
        )
        .bind(broadcast_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// Every recorded id, for warming an in-memory cache at startup.
    pub async fn all_ids(&self) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT broadcast_id FROM broadcasts_received")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
