//! Error types for the booking store

use studiobook_common::{internal_error, validation_error, StudiobookError};
use thiserror::Error;

/// Errors that can occur when working with the booking store
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A client-supplied total disagrees with the recomputed line-item sum
    #[error("Estimated total {supplied} does not match recomputed total {expected}")]
    TotalMismatch { expected: i64, supplied: i64 },

    /// A stored value could not be decoded (bad JSON, bad date, bad enum)
    #[error("Stored data error: {0}")]
    DataError(String),
}

impl From<DbError> for StudiobookError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::TotalMismatch { .. } => validation_error(err),
            other => internal_error(format!("store: {}", other)),
        }
    }
}
