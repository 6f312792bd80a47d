use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Season not found: {0}")]
    SeasonNotFound(String),

    #[error("Assignment not found: {season_id}/{match_id}")]
    AssignmentNotFound { season_id: String, match_id: String },
}

pub type Result<T> = std::result::Result<T, DbError>;
