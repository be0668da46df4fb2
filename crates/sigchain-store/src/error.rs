//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A data operation was attempted on a closed store.
    #[error("store is closed")]
    Closed,

    /// A lock guarding store state was poisoned by a panicking thread.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking database task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
