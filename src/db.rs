use std::time::Duration;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::DatabaseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseSource {
    Primary,
    Fallback,
}

/// Connects to the primary database and checks it answers `SELECT 1`
/// within the configured timeout. If it does not, the fallback database is
/// used instead. The decision is logged once.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<(SqlitePool, DatabaseSource)> {
    match open_checked(&config.url, config).await {
        Ok(pool) => {
            tracing::info!("Using primary database");
            Ok((pool, DatabaseSource::Primary))
        }
        Err(e) => {
            tracing::warn!("Primary database unavailable ({}), falling back to local database", e);
            let pool = open_checked(&config.fallback_url, config).await?;
            Ok((pool, DatabaseSource::Fallback))
        }
    }
}

async fn open_checked(url: &str, config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);

    let attempt = async {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(timeout)
            .connect(url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok::<_, sqlx::Error>(pool)
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => Ok(result?),
        Err(_) => anyhow::bail!("health check timed out after {}s", config.connect_timeout_secs),
    }
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
