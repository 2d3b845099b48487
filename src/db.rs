use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub fn connect_lazy(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .context("create postgres pool for analytics store")?;
    Ok(pool)
}

/// Round-trips a trivial query so callers can verify connectivity before
/// starting an analysis run.
pub async fn ping(db: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(db)
        .await
        .context("ping analytics database")?;
    Ok(())
}
