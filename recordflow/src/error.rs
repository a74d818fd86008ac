//! Error types for the recordflow pipeline.
//!
//! Every failure the library can surface is a variant of [`AppError`]. Each
//! variant carries the payload a caller needs to react to it (a path, a field
//! name, a row number) and maps to a short display code, so messages render as
//! `[CODE] message` at the command boundary.
//!
//! Row-scoped failures never abort a batch: their display string is recorded
//! in the result objects instead (see [`crate::models`]).

use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Application Errors
// =============================================================================

/// Top-level error for file, configuration and command failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input path does not exist.
    #[error("[NOT_FOUND] File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The OS refused access to the path.
    #[error("[PERMISSION_DENIED] Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// Malformed structured document.
    #[error("[FORMAT_ERROR] Invalid document '{}': {message}", .path.display())]
    Format { path: PathBuf, message: String },

    /// Any other failure while reading.
    #[error("[READ_ERROR] Error reading '{}': {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// Any failure while writing.
    #[error("[WRITE_ERROR] Error writing '{}': {message}", .path.display())]
    Write { path: PathBuf, message: String },

    /// A field rule failed.
    #[error("[VALIDATION_ERROR] Field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Bad configuration file or value.
    #[error("[CONFIG_ERROR] {0}")]
    Configuration(String),

    /// Row-scoped processing failure.
    #[error("[DATA_ERROR] Row {row}: {message}")]
    DataProcessing { row: usize, message: String },

    /// Inconsistent command arguments.
    #[error("[USAGE_ERROR] {0}")]
    InvalidArgument(String),

    /// Console or other unclassified I/O failure.
    #[error("[IO_ERROR] {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Short code used for display formatting.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::PermissionDenied { .. } => "PERMISSION_DENIED",
            AppError::Format { .. } => "FORMAT_ERROR",
            AppError::Read { .. } => "READ_ERROR",
            AppError::Write { .. } => "WRITE_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIG_ERROR",
            AppError::DataProcessing { .. } => "DATA_ERROR",
            AppError::InvalidArgument(_) => "USAGE_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether a retry policy may re-run the failed operation.
    ///
    /// Only the transient I/O classes qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Read { .. } | AppError::Write { .. } | AppError::Io(_)
        )
    }

    /// Classify an I/O error raised while reading `path`.
    pub fn from_read(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => AppError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => AppError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    /// Classify an I/O error raised while writing `path`.
    pub fn from_write(path: &Path, err: impl std::fmt::Display) -> Self {
        AppError::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for library operations.
pub type AppResult<T> = Result<T, AppError>;
