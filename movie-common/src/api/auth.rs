//! Bearer-token authentication and authorization contracts
//!
//! # Architecture
//!
//! - [`AccessToken`] is parsed from the `Authorization` header
//! - An [`AccessTokenConverter`] turns the token into a [`User`]
//! - An [`Authorizer`] decides whether that user may call a route
//!
//! No HTTP framework dependencies live here; the service wraps these in
//! axum middleware.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use super::types::GoogleUserInfo;
use crate::error::{Error, Result};
use crate::user::User;

/// Token type expected in the `Authorization` header
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// Default Google userinfo endpoint
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

// ========================================
// Access Token
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn new_bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            token_type: BEARER_TOKEN_TYPE.to_string(),
        }
    }

    /// Parse an `Authorization` header value of the form `Bearer <token>`
    ///
    /// # Examples
    ///
    /// ```
    /// use movie_common::api::auth::AccessToken;
    ///
    /// let token = AccessToken::parse_authorization("Bearer abc123def1").unwrap();
    /// assert_eq!(token.token, "abc123def1");
    ///
    /// assert!(AccessToken::parse_authorization("Basic dXNlcg==").is_err());
    /// ```
    pub fn parse_authorization(header: &str) -> Result<Self> {
        let (scheme, token) = header.trim().split_once(' ').ok_or_else(|| {
            Error::Unauthenticated("Authorization header must be 'Bearer <token>'".to_string())
        })?;

        if !scheme.eq_ignore_ascii_case(BEARER_TOKEN_TYPE) {
            return Err(Error::Unauthenticated(format!(
                "Unsupported authorization scheme: {}",
                scheme
            )));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Unauthenticated(
                "Bearer token is empty".to_string(),
            ));
        }

        Ok(Self::new_bearer(token))
    }
}

// ========================================
// Token Conversion
// ========================================

/// Turns an access token into the user it belongs to
#[async_trait]
pub trait AccessTokenConverter: Send + Sync {
    async fn convert(&self, token: &AccessToken) -> Result<User>;
}

/// Resolves tokens against an OAuth2 userinfo endpoint
pub struct GoogleAccessTokenConverter {
    http_client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleAccessTokenConverter {
    pub fn new(userinfo_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

#[async_trait]
impl AccessTokenConverter for GoogleAccessTokenConverter {
    async fn convert(&self, token: &AccessToken) -> Result<User> {
        tracing::debug!(url = %self.userinfo_url, "Resolving access token");

        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Userinfo request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Unauthenticated(
                "Access token rejected by identity provider".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Error::Internal(format!(
                "Identity provider returned {}",
                status.as_u16()
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Invalid userinfo payload: {}", e)))?;

        let user = User::from(info);
        if !user.is_valid() {
            return Err(Error::Unauthenticated(
                "Identity provider returned an incomplete profile".to_string(),
            ));
        }

        Ok(user)
    }
}

/// Maps every token to the same user (test double)
#[derive(Debug, Clone)]
pub struct FixedTokenConverter {
    pub user: User,
}

#[async_trait]
impl AccessTokenConverter for FixedTokenConverter {
    async fn convert(&self, _token: &AccessToken) -> Result<User> {
        Ok(self.user.clone())
    }
}

// ========================================
// Authorization
// ========================================

/// Decides whether a user may perform `method` on `path`
pub trait Authorizer: Send + Sync {
    fn authorize(&self, user: &User, method: &str, path: &str) -> Result<()>;
}

/// Authorizes users by email; an empty list lets every authenticated user in
#[derive(Debug, Clone, Default)]
pub struct EmailAllowListAuthorizer {
    emails: HashSet<String>,
}

impl EmailAllowListAuthorizer {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Authorizer for EmailAllowListAuthorizer {
    fn authorize(&self, user: &User, method: &str, path: &str) -> Result<()> {
        if self.emails.is_empty() || self.emails.contains(&user.email.to_ascii_lowercase()) {
            return Ok(());
        }

        Err(Error::Unauthorized(format!(
            "{} is not authorized for {} {}",
            user.email, method, path
        )))
    }
}

// ========================================
// Tests
// ========================================
