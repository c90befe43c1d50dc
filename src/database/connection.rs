//! Database connection management

use sqlx::{Pool, Postgres};
use crate::config::DatabaseConfig;
use crate::utils::errors::CampusEventsError;

pub type DatabasePool = Pool<Postgres>;

/// Open the pool and make sure the server answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, CampusEventsError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await?;

    tracing::info!(max_connections = config.max_connections, "Postgres pool ready");
    Ok(pool)
}

/// Apply the embedded migrations in `migrations/`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), CampusEventsError> {
    tracing::info!("Applying migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;

    tracing::info!("Schema is up to date");
    Ok(())
}

pub async fn health_check(pool: &DatabasePool) -> Result<(), CampusEventsError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await?;

    Ok(())
}
