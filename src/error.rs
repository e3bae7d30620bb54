//! Error types shared by all task adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single task adapter invocation.
///
/// Engine errors pass through verbatim so callers can branch on the
/// diagnostic text (e.g. `UNIQUE constraint failed`).
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("database file {} does not exist or is not accessible", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("file path {} does not exist or is not accessible", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// True when the engine rejected a write due to a constraint
    /// (primary-key or unique-column conflict).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            TaskError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
