//! Database setup and initialization

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use shoebox_core::IngestConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

/// Opens a pool on `database_url`, creating the file if needed, and applies
/// pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .context("Failed to open database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &IngestConfig) -> Result<SqlitePool> {
    tracing::info!(url = %config.database_url, "Opening database...");
    let pool = connect(&config.database_url, config.db_max_connections).await?;
    tracing::info!(
        max_connections = config.db_max_connections,
        "Database ready, migrations applied"
    );
    Ok(pool)
}
