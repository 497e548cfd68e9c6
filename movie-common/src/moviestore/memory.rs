//! In-memory movie store
//!
//! Test double for the SQLite store, used by the HTTP handler tests.
//! Overlapping transactions only conflict when they touch the same external
//! ID; the later commit then fails with `Exist` or `NotExist`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{movie_already_exists, movie_not_found, Datastore, Selector, Transaction, Transactor};
use crate::error::{Error, Result};
use crate::movie::Movie;

type MovieMap = BTreeMap<String, Movie>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDatastore {
    movies: Arc<Mutex<MovieMap>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, keyed by external ID
    pub fn with_movies(movies: impl IntoIterator<Item = Movie>) -> Self {
        let map = movies
            .into_iter()
            .map(|m| (m.external_id.clone(), m))
            .collect();
        Self {
            movies: Arc::new(Mutex::new(map)),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.movies).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(movies: &Mutex<MovieMap>) -> MutexGuard<'_, MovieMap> {
    movies.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// A write recorded by a transaction, replayed against the shared map on commit
#[derive(Debug, Clone)]
enum StagedOp {
    Create(Movie),
    Update(Movie),
    Delete(String),
}

impl StagedOp {
    fn apply(&self, movies: &mut MovieMap) -> Result<()> {
        match self {
            StagedOp::Create(movie) => {
                if movies.contains_key(&movie.external_id) {
                    return Err(movie_already_exists(&movie.external_id));
                }
                movies.insert(movie.external_id.clone(), movie.clone());
            }
            StagedOp::Update(movie) => {
                let stored = movies
                    .get_mut(&movie.external_id)
                    .ok_or_else(|| movie_not_found(&movie.external_id))?;

                // id, external_id and create audit stay as stored
                stored.title = movie.title.clone();
                stored.rated = movie.rated.clone();
                stored.released = movie.released;
                stored.run_time = movie.run_time;
                stored.director = movie.director.clone();
                stored.writer = movie.writer.clone();
                stored.update_user = movie.update_user.clone();
                stored.update_time = movie.update_time;
            }
            StagedOp::Delete(external_id) => {
                movies
                    .remove(external_id)
                    .ok_or_else(|| movie_not_found(external_id))?;
            }
        }
        Ok(())
    }
}

/// Writes go to a private view (snapshot at begin plus own writes) and are
/// logged; commit replays the log against the current shared map.
pub struct InMemoryTransaction {
    shared: Arc<Mutex<MovieMap>>,
    view: MovieMap,
    ops: Vec<StagedOp>,
}

impl InMemoryTransaction {
    fn stage(&mut self, cancel: &CancellationToken, op: StagedOp) -> Result<()> {
        check_cancelled(cancel)?;
        op.apply(&mut self.view)?;
        self.ops.push(op);
        Ok(())
    }
}

#[async_trait]
impl Transactor for InMemoryTransaction {
    async fn create(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        self.stage(cancel, StagedOp::Create(movie.clone()))
    }

    async fn update(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        self.stage(cancel, StagedOp::Update(movie.clone()))
    }

    async fn delete(&mut self, cancel: &CancellationToken, movie: &Movie) -> Result<()> {
        self.stage(cancel, StagedOp::Delete(movie.external_id.clone()))
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    /// All-or-nothing: a replay conflict leaves the shared map untouched
    async fn commit(self: Box<Self>) -> Result<()> {
        let mut guard = lock(&self.shared);
        let mut next = guard.clone();
        for op in &self.ops {
            op.apply(&mut next)?;
        }
        *guard = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Selector for InMemoryDatastore {
    async fn find_by_id(&self, cancel: &CancellationToken, external_id: &str) -> Result<Movie> {
        check_cancelled(cancel)?;
        lock(&self.movies)
            .get(external_id)
            .cloned()
            .ok_or_else(|| movie_not_found(external_id))
    }

    async fn find_all(&self, cancel: &CancellationToken) -> Result<Vec<Movie>> {
        check_cancelled(cancel)?;
        let mut movies: Vec<Movie> = lock(&self.movies).values().cloned().collect();
        movies.sort_by(|a, b| {
            a.create_time
                .cmp(&b.create_time)
                .then_with(|| a.external_id.cmp(&b.external_id))
        });
        Ok(movies)
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn begin(&self, cancel: &CancellationToken) -> Result<Box<dyn Transaction>> {
        check_cancelled(cancel)?;
        let view = lock(&self.movies).clone();
        Ok(Box::new(InMemoryTransaction {
            shared: Arc::clone(&self.movies),
            view,
            ops: Vec::new(),
        }))
    }
}
