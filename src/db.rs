use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

/// Connects to Postgres, retrying every `retry_every` until it succeeds.
///
/// The URL is never logged since it usually carries credentials.
pub async fn connect_with_retry(url: &str, max_connections: u32, retry_every: Duration) -> PgPool {
    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
        {
            Ok(pool) => {
                info!("connected to database");
                return pool;
            }
            Err(e) => {
                error!(
                    error = %e,
                    retry_in_secs = retry_every.as_secs(),
                    "can't connect to database"
                );
                tokio::time::sleep(retry_every).await;
            }
        }
    }
}

pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run database migrations")?;
    Ok(())
}
