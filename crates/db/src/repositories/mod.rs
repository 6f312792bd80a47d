mod assignment_repository;
mod broadcast_repository;
mod match_result_repository;
mod season_repository;

pub use assignment_repository::*;
pub use broadcast_repository::*;
pub use match_result_repository::*;
pub use season_repository::*;

#[cfg(test)]
pub(crate) async fn setup_test_db() -> sqlx::SqlitePool {
    let pool = crate::create_pool("sqlite::memory:").await.unwrap();
    crate::run_migrations(&pool).await.unwrap();
    pool
}
