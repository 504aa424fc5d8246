//! Error types for triage
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, unknown task, bad config)
//! - 3: Sync failed (ticket source auth/transport)
//! - 4: Operation failed (storage, lock)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the triage CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const SYNC_FAILED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for triage operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The id no longer names a live task (already archived or deleted by a
    /// previous action). Recoverable: callers may treat it as a no-op.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Sync failures (exit code 3)
    #[error("Ticket source rejected authorization: {0}")]
    Auth(String),

    #[error("Ticket source unreachable: {0}")]
    Transport(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Storage inconsistency: {0}")]
    Storage(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::TaskNotFound(_) => exit_codes::USER_ERROR,

            // Sync failures
            Error::Auth(_) | Error::Transport(_) => exit_codes::SYNC_FAILED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Storage(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// True for discovery-collaborator failures that must not commit a batch.
    pub fn is_sync_failure(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::Transport(_))
    }
}

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
        }
    }
}
