//! # Movie Common Library
//!
//! Shared code for the movie service:
//! - Movie entity and validation
//! - Persistence contracts and their SQLite / in-memory stores
//! - Authentication contracts (access tokens, users, authorization)
//! - Configuration loading and database setup
//! - Error taxonomy

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod movie;
pub mod moviestore;
pub mod random;
pub mod time;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use movie::Movie;
pub use user::User;
