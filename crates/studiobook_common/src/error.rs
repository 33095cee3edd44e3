// --- File: crates/studiobook_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type shared across all Studiobook crates.
///
/// The variants mirror the conditions the API surfaces to clients:
/// validation and reference failures map to 4xx, store and third-party
/// failures to 5xx. Crate-local errors convert into this type via `From`.
#[derive(Error, Debug)]
pub enum StudiobookError {
    /// Client-supplied data failed validation (e.g. totals mismatch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced booking or session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The payment processor does not report the session as fully paid
    #[error("Payment not completed: {0}")]
    PaymentNotCompleted(String),

    /// The payment session lacks required linkage metadata
    #[error("Missing session metadata: {0}")]
    MissingMetadata(String),

    /// A store or third-party call failed
    #[error("Upstream failure: {service} - {message}")]
    Upstream { service: String, message: String },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything that does not fit the taxonomy above
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for StudiobookError {
    fn status_code(&self) -> u16 {
        match self {
            StudiobookError::Validation(_) => 400,
            StudiobookError::NotFound(_) => 404,
            StudiobookError::PaymentNotCompleted(_) => 402,
            StudiobookError::MissingMetadata(_) => 400,
            StudiobookError::Upstream { .. } => 502,
            StudiobookError::Config(_) => 500,
            StudiobookError::Internal(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for StudiobookError {
    fn from(err: reqwest::Error) -> Self {
        StudiobookError::Upstream {
            service: "http".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StudiobookError {
    fn from(err: serde_json::Error) -> Self {
        StudiobookError::Internal(format!("JSON error: {}", err))
    }
}

// Utility constructors
pub fn validation_error<T: fmt::Display>(message: T) -> StudiobookError {
    StudiobookError::Validation(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> StudiobookError {
    StudiobookError::NotFound(message.to_string())
}

pub fn upstream_error<T: fmt::Display>(service: &str, message: T) -> StudiobookError {
    StudiobookError::Upstream {
        service: service.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> StudiobookError {
    StudiobookError::Internal(message.to_string())
}
