//! PostgreSQL adapter for the lexika search subsystem.
//!
//! Translates [`Specification`](lexika_core::query::spec::Specification)
//! trees into parameterized SQL and implements the repository port over a
//! sqlx connection pool. The core crate stays free of storage types; this
//! crate owns everything Postgres-specific.

use sqlx::postgres::PgPoolOptions;

pub mod search_repo;
pub mod sql;

pub use search_repo::PgSearchRepository;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
