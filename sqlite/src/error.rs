//! Error types for relational-projection operations.
//!
//! Provides a unified error type covering database access, row conversion,
//! and projection failures. Any error raised while a projection transaction
//! is open causes the whole transaction to roll back, leaving the store in
//! its prior state.

use thiserror::Error;

/// Errors that can occur while projecting into or managing the SQLite store.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Opaque payload could not be serialized for storage.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Projection transaction failure.
    #[error("projection error: {0}")]
    ProjectionError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
