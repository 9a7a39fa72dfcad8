//! Structured error types for store operations.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    CorruptData,
    InvalidOperation,
    Validation,
    Io,
}

/// Errors returned by the task entity and the task store.
#[derive(Debug, Error)]
pub enum PlanitError {
    /// Missing project file or referenced task.
    #[error("{0}")]
    NotFound(String),

    /// Re-initializing over an existing project file.
    #[error("{0}")]
    AlreadyExists(String),

    /// The persisted document could not be parsed.
    #[error("{message}")]
    CorruptData {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The operation would violate a tree or status invariant.
    #[error("{0}")]
    InvalidOperation(String),

    /// Input rejected before touching any state.
    #[error("{0}")]
    Validation(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlanitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PlanitError::NotFound(_) => ErrorCode::NotFound,
            PlanitError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            PlanitError::CorruptData { .. } => ErrorCode::CorruptData,
            PlanitError::InvalidOperation(_) => ErrorCode::InvalidOperation,
            PlanitError::Validation(_) => ErrorCode::Validation,
            PlanitError::Io { .. } => ErrorCode::Io,
        }
    }

    // Convenience constructors

    pub fn task_not_found(task_id: &str) -> Self {
        Self::NotFound(format!("Task not found: {}", task_id))
    }

    pub fn project_not_found(path: &Path) -> Self {
        Self::NotFound(format!(
            "{} not found. Run `planit init` to create a project.",
            path.display()
        ))
    }

    pub fn project_exists(path: &Path) -> Self {
        Self::AlreadyExists(format!("File {} already exists", path.display()))
    }

    pub fn corrupt(path: &Path, err: serde_json::Error) -> Self {
        Self::CorruptData {
            message: format!("Cannot parse {}: {}", path.display(), err),
            source: Some(err),
        }
    }

    pub fn unserializable(path: &Path, err: serde_json::Error) -> Self {
        Self::CorruptData {
            message: format!("Cannot serialize project for {}: {}", path.display(), err),
            source: Some(err),
        }
    }

    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for store operations.
pub type PlanitResult<T> = std::result::Result<T, PlanitError>;
