//! Movie persistence contracts
//!
//! Write side: a [`Datastore`] hands out a [`Transaction`], which is a
//! [`Transactor`] plus commit/rollback. Transactor methods never finalize
//! the transaction; whoever began it commits on success and rolls back on
//! any error (see [`commit_or_rollback`]).
//!
//! Read side: [`Selector`], implemented directly by the datastore.
//!
//! Every call takes the request's [`CancellationToken`]; implementations
//! abandon the store call and return [`Error::Cancelled`] once it fires.
//!
//! Stores do not validate movies. Callers run `Movie::is_valid` first.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Error, Result};
use crate::movie::Movie;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryDatastore;
pub use sqlite::SqliteDatastore;

/// Write-side operations, executed inside a caller-owned transaction
#[async_trait]
pub trait Transactor: Send {
    /// Insert a new movie. Duplicate external IDs fail with `Exist`.
    async fn create(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()>;

    /// Persist mutable fields of the movie located by its external ID.
    /// Missing rows fail with `NotExist`.
    async fn update(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()>;

    /// Remove the movie located by its external ID.
    /// Missing rows fail with `NotExist`.
    async fn delete(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()>;
}

/// A transaction boundary that also exposes the write operations
#[async_trait]
pub trait Transaction: Transactor {
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Read-side operations
#[async_trait]
pub trait Selector: Send + Sync {
    /// Fetch one movie by external ID; `NotExist` when absent
    async fn find_by_id(&self, cancel: &CancellationToken, external_id: &str) -> Result<Movie>;

    /// Fetch every movie ordered by create time, then external ID
    async fn find_all(&self, cancel: &CancellationToken) -> Result<Vec<Movie>>;
}

/// A movie store: reads directly, writes through transactions
#[async_trait]
pub trait Datastore: Selector {
    async fn begin(&self, cancel: &CancellationToken) -> Result<Box<dyn Transaction>>;
}

/// Finalize `tx` according to `result`
///
/// Commits when `result` is `Ok`, otherwise rolls back and returns the
/// original error. A failed rollback is logged, not surfaced.
pub async fn commit_or_rollback(tx: Box<dyn Transaction>, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => tx.commit().await,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback failed after {}: {}", e, rollback_err);
            }
            Err(e)
        }
    }
}

/// Shortcut for `Error::NotExist` naming the external ID
pub(crate) fn movie_not_found(external_id: &str) -> Error {
    Error::NotExist(format!("No movie exists for the given external ID: {}", external_id))
}

/// Shortcut for `Error::Exist` naming the external ID
pub(crate) fn movie_already_exists(external_id: &str) -> Error {
    Error::Exist(format!("A movie already exists with external ID: {}", external_id))
}
