// --- File: crates/studiobook_stripe/src/error.rs ---
use studiobook_common::{upstream_error, HttpStatusCode, StudiobookError};
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API
    #[error("Stripe API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete")]
    ConfigError,

    /// The session exists but the processor does not report it as paid
    #[error("Session {session_id} is not paid (payment_status: {payment_status})")]
    SessionNotPaid {
        session_id: String,
        payment_status: String,
    },

    /// The session lacks a required metadata key
    #[error("Session metadata missing key: {0}")]
    MissingMetadata(String),

    /// Internal processing error
    #[error("Internal processing error: {0}")]
    InternalError(String),
}

impl From<StripeError> for StudiobookError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::ApiError { status_code: 404, message } => {
                StudiobookError::NotFound(format!("Stripe session: {}", message))
            }
            StripeError::ApiError { status_code, message } => upstream_error(
                "Stripe API",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            StripeError::RequestError(e) => upstream_error("Stripe API", e),
            StripeError::ParseError(e) => upstream_error("Stripe API", format!("parse: {}", e)),
            StripeError::ConfigError => {
                StudiobookError::Config("Stripe configuration missing or incomplete".to_string())
            }
            StripeError::SessionNotPaid { session_id, payment_status } => {
                StudiobookError::PaymentNotCompleted(format!(
                    "session {} has payment_status {}",
                    session_id, payment_status
                ))
            }
            StripeError::MissingMetadata(key) => StudiobookError::MissingMetadata(key),
            StripeError::InternalError(msg) => StudiobookError::Internal(msg),
        }
    }
}

impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::RequestError(_) => 502,
            StripeError::ApiError { status_code: 404, .. } => 404,
            StripeError::ApiError { .. } => 502,
            StripeError::ParseError(_) => 502,
            StripeError::ConfigError => 500,
            StripeError::SessionNotPaid { .. } => 402,
            StripeError::MissingMetadata(_) => 400,
            StripeError::InternalError(_) => 500,
        }
    }
}
