//! Error types for standup.
//!
//! Every failure in the crate is an [`Error`]. Callers that only care about
//! how to react (fix the input, retry, report a conflict) use
//! [`Error::kind`] to collapse it onto the [`ErrorKind`] taxonomy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for standup operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// A request was missing a field or carried an unacceptable value.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// No member exists with the given id.
    #[error("member {id} not found")]
    MemberNotFound {
        /// The id that was looked up.
        id: i64,
    },

    /// A member with this name already exists.
    #[error("member '{name}' already exists")]
    DuplicateMember {
        /// The colliding name.
        name: String,
    },

    /// The member exists but the supplied credential does not match.
    #[error("invalid credential for member {id}")]
    InvalidCredential {
        /// The member whose credential was rejected.
        id: i64,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for standup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors, as seen across the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller must fix the request before retrying.
    InvalidInput,
    /// The referenced member does not exist.
    NotFound,
    /// A member name collided with an existing one.
    DuplicateMember,
    /// The member exists but the secret was wrong.
    InvalidCredential,
    /// Persistence or other internal failure. Safe to retry.
    StorageUnavailable,
}

impl ErrorKind {
    /// Whether a caller may retry the same request unchanged.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::StorageUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::NotFound => write!(f, "not_found"),
            Self::DuplicateMember => write!(f, "duplicate_member"),
            Self::InvalidCredential => write!(f, "invalid_credential"),
            Self::StorageUnavailable => write!(f, "storage_unavailable"),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error for callers on the other side of the boundary.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::MemberNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateMember { .. } => ErrorKind::DuplicateMember,
            Self::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::ConfigLoad(_)
            | Self::ConfigValidation { .. }
            | Self::Io(_)
            | Self::DirectoryCreate { .. }
            | Self::Json(_)
            | Self::Internal(_) => ErrorKind::StorageUnavailable,
        }
    }

    /// Check if this error means the member does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MemberNotFound { .. })
    }

    /// Check if this error is a rejected credential.
    #[must_use]
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, Self::InvalidCredential { .. })
    }
}
