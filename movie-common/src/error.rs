//! Common error types for the movie service
//!
//! Every error carries an [`ErrorKind`] so the HTTP layer can pick a status
//! code without inspecting store-specific details.

use std::fmt;

use thiserror::Error;

/// Common result type for movie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input on a named field
    Validation,
    /// Item already exists (unique constraint)
    Exist,
    /// Item does not exist
    NotExist,
    /// Caller could not be identified
    Unauthenticated,
    /// Caller is known but not allowed
    Unauthorized,
    /// Backing store unreachable or failed unexpectedly
    Database,
    /// Request-scoped cancellation fired mid-operation
    Cancelled,
    /// Configuration loading or parsing
    Config,
    /// File system I/O
    Io,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable wire name used in error response bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "input_validation_error",
            ErrorKind::Exist => "item_already_exists",
            ErrorKind::NotExist => "item_does_not_exist",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Database => "database_error",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "configuration_error",
            ErrorKind::Io => "io_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    /// Field-level validation failure
    #[error("{message}")]
    Validation {
        param: String,
        code: Option<String>,
        message: String,
        #[source]
        source: Option<chrono::ParseError>,
    },

    /// Unique constraint violated
    #[error("Already exists: {0}")]
    Exist(String),

    /// No matching row
    #[error("Not found: {0}")]
    NotExist(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation error for `param` with a free-form message
    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            param: param.into(),
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Validation error reporting that `field` was not supplied
    pub fn missing_field(param: impl Into<String>, field: &str) -> Self {
        Error::validation(param, format!("Missing Required Field: {}", field))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Exist(_) => ErrorKind::Exist,
            Error::NotExist(_) => ErrorKind::NotExist,
            Error::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Database(_) => ErrorKind::Database,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Offending parameter name (validation errors only)
    pub fn param(&self) -> Option<&str> {
        match self {
            Error::Validation { param, .. } => Some(param),
            _ => None,
        }
    }

    /// Machine-readable code (validation errors only, when set)
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Validation { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
