//! Shared API request/response types

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::user::User;

// ========================================
// Error Response Types
// ========================================

/// Error payload returned by every failing endpoint
///
/// # Examples
///
/// ```
/// use movie_common::api::types::ErrorResponse;
/// use movie_common::Error;
///
/// let err = Error::missing_field("title", "title");
/// let body = ErrorResponse::from(&err);
/// assert_eq!(body.error.kind, "input_validation_error");
/// assert_eq!(body.error.param.as_deref(), Some("title"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Wire name of the error kind
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self {
            error: ErrorBody {
                kind: err.kind().as_str().to_string(),
                code: err.code().map(str::to_string),
                param: err.param().map(str::to_string),
                message: err.to_string(),
            },
        }
    }
}

// ========================================
// Identity Provider Types
// ========================================

/// Google OAuth2 userinfo payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub name: String,
    /// Hosted G Suite domain, absent for consumer accounts
    #[serde(default)]
    pub hd: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub link: String,
}

impl From<GoogleUserInfo> for User {
    fn from(info: GoogleUserInfo) -> Self {
        User {
            email: info.email,
            last_name: info.family_name,
            first_name: info.given_name,
            full_name: info.name,
            hosted_domain: info.hd,
            picture_url: info.picture,
            profile_link: info.link,
        }
    }
}

// ========================================
// Tests
// ========================================
