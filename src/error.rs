//! Error types for zenith
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid config, form validation)
//! - 3: Blocked (no session, authentication failed)
//! - 4: Operation failed (storage, io, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the zenith CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for zenith operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid task: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    // Blocked (exit code 3)
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    AuthenticationFailed(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::Validation(_) => {
                exit_codes::USER_ERROR
            }

            // Blocked
            Error::NotAuthenticated | Error::AuthenticationFailed(_) => exit_codes::BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::StorageUnavailable(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured payload attached to JSON error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(fields) => serde_json::to_value(fields).ok(),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for zenith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        let kind = match err.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::BLOCKED => "blocked",
            _ => "operation_failed",
        };
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind,
            details: err.details(),
        }
    }
}
