use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::error::{AppError, Result};

pub mod schema;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool.
///
/// Connectivity failures are retried up to `max_connect_attempts` times
/// with a short backoff, then surfaced to the caller.
pub async fn init_db_pool(config: &Config) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut attempt = 0;
    loop {
        attempt += 1;

        let connected = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options.clone())
            .await;

        match connected {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < config.max_connect_attempts => {
                tracing::warn!(attempt, error = %e, "database connection failed, retrying");
                tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "database connection failed after {attempt} attempts");
                return Err(AppError::Database(e));
            }
        }
    }
}
