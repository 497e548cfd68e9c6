//! Database schema migrations
//!
//! Versioned, idempotent schema changes tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Keep them idempotent** - `IF NOT EXISTS` or an explicit existence check
//!
//! # Example Migration
//!
//! ```rust,ignore
//! async fn migrate_v4(pool: &SqlitePool) -> Result<()> {
//!     let has_column: i64 = sqlx::query_scalar(
//!         "SELECT COUNT(*) FROM pragma_table_info('movie') WHERE name = 'year'"
//!     )
//!     .fetch_one(pool)
//!     .await?;
//!
//!     if has_column == 0 {
//!         sqlx::query("ALTER TABLE movie ADD COLUMN year INTEGER")
//!             .execute(pool)
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Create the version tracking table
pub async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database
///
/// Returns 0 if schema_version table has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
        info!("✓ Migration v3 completed");
    }

    Ok(())
}

/// Migration v1: user and movie tables
///
/// Audit users are stored once per email and referenced from `movie`, so a
/// movie can be read back with complete user profiles.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: create app_user and movie tables");

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_user (
            email TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            hosted_domain TEXT NOT NULL DEFAULT '',
            picture_url TEXT NOT NULL DEFAULT '',
            profile_link TEXT NOT NULL DEFAULT '',
            update_time TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie (
            movie_id TEXT PRIMARY KEY,
            extl_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            rated TEXT NOT NULL,
            released TEXT,
            run_time INTEGER NOT NULL,
            director TEXT NOT NULL,
            writer TEXT NOT NULL,
            create_user_email TEXT NOT NULL REFERENCES app_user(email),
            create_time TEXT NOT NULL,
            update_user_email TEXT NOT NULL REFERENCES app_user(email),
            update_time TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Migration v2: index backing find-all ordering
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: index movie(create_time, extl_id)");

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_movie_create_time ON movie (create_time, extl_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Profile columns copied onto each movie row by v3
const AUDIT_PROFILE_COLUMNS: [&str; 6] = [
    "last_name",
    "first_name",
    "full_name",
    "hosted_domain",
    "picture_url",
    "profile_link",
];

/// Migration v3: audit user profiles stored per movie
///
/// `app_user` keeps the latest profile for each email, so joining it made a
/// movie's create user change whenever that email signed in with a new
/// profile. Each movie now carries its own create/update profile snapshot.
/// Existing rows are backfilled from `app_user`.
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v3: per-movie audit user profiles");

    let mut tx = pool.begin().await?;

    for role in ["create_user", "update_user"] {
        for field in AUDIT_PROFILE_COLUMNS {
            let column = format!("{}_{}", role, field);

            let has_column: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM pragma_table_info('movie') WHERE name = ?",
            )
            .bind(&column)
            .fetch_one(&mut *tx)
            .await?;

            if has_column == 0 {
                sqlx::query(&format!(
                    "ALTER TABLE movie ADD COLUMN {} TEXT NOT NULL DEFAULT ''",
                    column
                ))
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query(&format!(
                "UPDATE movie SET {column} = COALESCE( \
                 (SELECT u.{field} FROM app_user u WHERE u.email = movie.{role}_email), '') \
                 WHERE {column} = ''"
            ))
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}
