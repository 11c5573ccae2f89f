use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::infra::config::AppConfig;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connects with exponential backoff so the service survives starting before
/// the database is ready, then applies pending migrations.
pub async fn init_db(config: &AppConfig) -> anyhow::Result<PgPool> {
    let mut backoff = Duration::from_millis(config.db_retry_backoff_ms);
    let mut attempt = 0;

    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) if attempt < config.db_connect_retries => {
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = config.db_connect_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Postgres connection failed, retrying"
                );
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Postgres connection failed after {attempt} retries (check DATABASE_URL/password): {e}"
                ));
            }
        }
    };
    info!("Connected to database!");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database migration failed: {e}"))?;
    info!("Database migrations applied");

    Ok(pool)
}
