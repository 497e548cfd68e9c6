//! SQLite movie store
//!
//! Timestamps are stored as RFC 3339 text with fixed nanosecond precision so
//! that lexical order matches chronological order.
//!
//! Each movie row carries a snapshot of its create and update user profiles.
//! `app_user` holds the latest profile per email and backs the foreign keys;
//! reads never consult it, so a later sign-in cannot rewrite a movie's audit.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::{movie_already_exists, movie_not_found, Datastore, Selector, Transaction, Transactor};
use crate::error::{Error, Result};
use crate::movie::Movie;
use crate::time;
use crate::user::User;

const SELECT_MOVIE: &str = r#"
    SELECT movie_id, extl_id, title, rated, released, run_time,
           director, writer, create_time, update_time,
           create_user_email, create_user_last_name, create_user_first_name,
           create_user_full_name, create_user_hosted_domain,
           create_user_picture_url, create_user_profile_link,
           update_user_email, update_user_last_name, update_user_first_name,
           update_user_full_name, update_user_hosted_domain,
           update_user_picture_url, update_user_profile_link
    FROM movie
"#;

/// Movie store backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteDatastore {
    pool: SqlitePool,
}

impl SqliteDatastore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Open SQLite transaction; dropped without commit means rolled back
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

/// Run a store call unless `cancel` fires first
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res.map_err(Error::from),
    }
}

fn db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_db_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    time::parse_rfc3339(value)
        .map_err(|e| Error::Internal(format!("Invalid {} value {:?}: {}", column, value, e)))
}

async fn upsert_user(conn: &mut SqliteConnection, user: &User) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO app_user (
            email, last_name, first_name, full_name,
            hosted_domain, picture_url, profile_link, update_time
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            last_name = excluded.last_name,
            first_name = excluded.first_name,
            full_name = excluded.full_name,
            hosted_domain = excluded.hosted_domain,
            picture_url = excluded.picture_url,
            profile_link = excluded.profile_link,
            update_time = excluded.update_time
        "#,
    )
    .bind(&user.email)
    .bind(&user.last_name)
    .bind(&user.first_name)
    .bind(&user.full_name)
    .bind(&user.hosted_domain)
    .bind(&user.picture_url)
    .bind(&user.profile_link)
    .bind(db_timestamp(&time::now()))
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_movie(conn: &mut SqliteConnection, movie: &Movie) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO movie (
            movie_id, extl_id, title, rated, released, run_time,
            director, writer, create_time, update_time,
            create_user_email, create_user_last_name, create_user_first_name,
            create_user_full_name, create_user_hosted_domain,
            create_user_picture_url, create_user_profile_link,
            update_user_email, update_user_last_name, update_user_first_name,
            update_user_full_name, update_user_hosted_domain,
            update_user_picture_url, update_user_profile_link
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(movie.id.to_string())
    .bind(&movie.external_id)
    .bind(&movie.title)
    .bind(&movie.rated)
    .bind(movie.released.as_ref().map(db_timestamp))
    .bind(movie.run_time)
    .bind(&movie.director)
    .bind(&movie.writer)
    .bind(db_timestamp(&movie.create_time))
    .bind(db_timestamp(&movie.update_time))
    .bind(&movie.create_user.email)
    .bind(&movie.create_user.last_name)
    .bind(&movie.create_user.first_name)
    .bind(&movie.create_user.full_name)
    .bind(&movie.create_user.hosted_domain)
    .bind(&movie.create_user.picture_url)
    .bind(&movie.create_user.profile_link)
    .bind(&movie.update_user.email)
    .bind(&movie.update_user.last_name)
    .bind(&movie.update_user.first_name)
    .bind(&movie.update_user.full_name)
    .bind(&movie.update_user.hosted_domain)
    .bind(&movie.update_user.picture_url)
    .bind(&movie.update_user.profile_link)
    .execute(conn)
    .await?;

    Ok(())
}

/// Identity and create-audit columns are deliberately absent from the SET list
async fn update_movie(conn: &mut SqliteConnection, movie: &Movie) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE movie
        SET title = ?, rated = ?, released = ?, run_time = ?,
            director = ?, writer = ?, update_time = ?,
            update_user_email = ?, update_user_last_name = ?,
            update_user_first_name = ?, update_user_full_name = ?,
            update_user_hosted_domain = ?, update_user_picture_url = ?,
            update_user_profile_link = ?
        WHERE extl_id = ?
        "#,
    )
    .bind(&movie.title)
    .bind(&movie.rated)
    .bind(movie.released.as_ref().map(db_timestamp))
    .bind(movie.run_time)
    .bind(&movie.director)
    .bind(&movie.writer)
    .bind(db_timestamp(&movie.update_time))
    .bind(&movie.update_user.email)
    .bind(&movie.update_user.last_name)
    .bind(&movie.update_user.first_name)
    .bind(&movie.update_user.full_name)
    .bind(&movie.update_user.hosted_domain)
    .bind(&movie.update_user.picture_url)
    .bind(&movie.update_user.profile_link)
    .bind(&movie.external_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

async fn delete_movie(conn: &mut SqliteConnection, external_id: &str) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM movie WHERE extl_id = ?")
        .bind(external_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

fn row_to_user(row: &SqliteRow, prefix: &str) -> Result<User> {
    let col = |name: &str| format!("{}_{}", prefix, name);

    Ok(User {
        email: row.try_get(col("email").as_str())?,
        last_name: row.try_get(col("last_name").as_str())?,
        first_name: row.try_get(col("first_name").as_str())?,
        full_name: row.try_get(col("full_name").as_str())?,
        hosted_domain: row.try_get(col("hosted_domain").as_str())?,
        picture_url: row.try_get(col("picture_url").as_str())?,
        profile_link: row.try_get(col("profile_link").as_str())?,
    })
}

fn row_to_movie(row: &SqliteRow) -> Result<Movie> {
    let id_str: String = row.try_get("movie_id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Invalid movie_id {:?}: {}", id_str, e)))?;

    let released: Option<String> = row.try_get("released")?;
    let released = released
        .map(|s| parse_db_timestamp("released", &s))
        .transpose()?;

    let create_time: String = row.try_get("create_time")?;
    let update_time: String = row.try_get("update_time")?;

    Ok(Movie {
        id,
        external_id: row.try_get("extl_id")?,
        title: row.try_get("title")?,
        rated: row.try_get("rated")?,
        released,
        run_time: row.try_get("run_time")?,
        director: row.try_get("director")?,
        writer: row.try_get("writer")?,
        create_user: row_to_user(row, "create_user")?,
        create_time: parse_db_timestamp("create_time", &create_time)?,
        update_user: row_to_user(row, "update_user")?,
        update_time: parse_db_timestamp("update_time", &update_time)?,
    })
}

#[async_trait]
impl Transactor for SqliteTransaction {
    async fn create(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        cancellable(cancel, upsert_user(&mut self.tx, &movie.create_user)).await?;
        if movie.update_user != movie.create_user {
            cancellable(cancel, upsert_user(&mut self.tx, &movie.update_user)).await?;
        }

        cancellable(cancel, insert_movie(&mut self.tx, movie))
            .await
            .map_err(|e| match e {
                Error::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    movie_already_exists(&movie.external_id)
                }
                other => other,
            })?;

        debug!(extl_id = %movie.external_id, "Inserted movie");
        Ok(())
    }

    async fn update(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        cancellable(cancel, upsert_user(&mut self.tx, &movie.update_user)).await?;

        let rows = cancellable(cancel, update_movie(&mut self.tx, movie)).await?;
        if rows == 0 {
            return Err(movie_not_found(&movie.external_id));
        }

        debug!(extl_id = %movie.external_id, "Updated movie");
        Ok(())
    }

    async fn delete(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        let rows = cancellable(cancel, delete_movie(&mut self.tx, &movie.external_id)).await?;
        if rows == 0 {
            return Err(movie_not_found(&movie.external_id));
        }

        debug!(extl_id = %movie.external_id, "Deleted movie");
        Ok(())
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Selector for SqliteDatastore {
    async fn find_by_id(&self, cancel: &CancellationToken, external_id: &str) -> Result<Movie> {
        let sql = format!("{} WHERE extl_id = ?", SELECT_MOVIE);
        let row = cancellable(
            cancel,
            sqlx::query(&sql).bind(external_id).fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => row_to_movie(&row),
            None => Err(movie_not_found(external_id)),
        }
    }

    async fn find_all(&self, cancel: &CancellationToken) -> Result<Vec<Movie>> {
        let sql = format!("{} ORDER BY create_time, extl_id", SELECT_MOVIE);
        let rows = cancellable(cancel, sqlx::query(&sql).fetch_all(&self.pool)).await?;

        rows.iter().map(row_to_movie).collect()
    }
}

#[async_trait]
impl Datastore for SqliteDatastore {
    async fn begin(&self, cancel: &CancellationToken) -> Result<Box<dyn Transaction>> {
        let tx = cancellable(cancel, self.pool.begin()).await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}
