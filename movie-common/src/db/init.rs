//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and brings the schema up
//! to date.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::Result;

/// Initialize database connection and create tables if needed
pub async fn init_database(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = if config.is_in_memory() {
        // Every connection to :memory: is a separate database, so pin the pool to one
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?
    } else {
        let newly_created = !config.path.exists();

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite://{}?mode=rwc", config.path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            // WAL allows concurrent readers with one writer
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", config.path.display());
        } else {
            info!("Opened existing database: {}", config.path.display());
        }

        pool
    };

    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}
