//! PostgreSQL plumbing: the pool, embedded migrations and the unit of work.

pub mod unit_of_work;

use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseSettings;

pub use unit_of_work::{PgTransaction, PgUnitOfWork};

/// Schema for the `users` table, embedded at compile time.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a pool sized from `settings`. Fails when the first connection cannot
/// be established within `acquire_timeout` seconds.
#[tracing::instrument(name = "database.create_pool", skip_all, fields(max = settings.max_connections))]
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await?;
    tracing::debug!(size = pool.size(), "Connection pool ready");
    Ok(pool)
}

/// Apply pending migrations. Already applied ones are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let pending = MIGRATOR.iter().count();
    MIGRATOR.run(pool).await?;
    tracing::debug!(known = pending, "Migrations checked");
    Ok(())
}
