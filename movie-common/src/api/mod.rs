//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Authentication/authorization contracts and their implementations
//! - Shared wire types
//!
//! The service wraps these with framework-specific middleware (Axum).

pub mod auth;
pub mod types;

pub use auth::{
    AccessToken, AccessTokenConverter, Authorizer, EmailAllowListAuthorizer,
    FixedTokenConverter, GoogleAccessTokenConverter, BEARER_TOKEN_TYPE,
};
pub use types::{ErrorBody, ErrorResponse, GoogleUserInfo};
