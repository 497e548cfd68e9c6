//! HTTP boundary errors
//!
//! Maps the common error taxonomy onto status codes and the JSON error body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use movie_common::api::{ErrorBody, ErrorResponse};
use movie_common::ErrorKind;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Common(#[from] movie_common::Error),

    /// Body missing, not JSON, or wrong shape
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

/// Status code for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotExist => StatusCode::NOT_FOUND,
        ErrorKind::Exist => StatusCode::CONFLICT,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Database | ErrorKind::Config | ErrorKind::Io | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, mut body) = match &self {
            ApiError::Common(err) => (status_for(err.kind()), ErrorResponse::from(err)),
            ApiError::Body(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: ErrorBody {
                        kind: ErrorKind::Validation.as_str().to_string(),
                        code: Some("invalid_request_body".to_string()),
                        param: None,
                        message: rejection.body_text(),
                    },
                },
            ),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
            // Store and driver details stay in the log
            body.error.message = "Internal server error".to_string();
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "Request rejected: {}", self);
        }

        (status, Json(body)).into_response()
    }
}
