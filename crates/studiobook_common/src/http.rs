// --- File: crates/studiobook_common/src/http.rs ---
use crate::error::HttpStatusCode;
use axum::http::StatusCode;
use once_cell::sync::Lazy;
use reqwest::{Client, Error as ReqwestError};
use std::fmt;
use std::time::Duration;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A static HTTP client that can be reused across the application.
/// This client is configured with a default timeout and follows redirects.
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client")
});

/// Creates a new HTTP client with custom configuration.
pub fn create_client(timeout_secs: u64, follow_redirects: bool) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(if follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        })
        .build()
}

/// Maps a taxonomy error to the `(StatusCode, String)` pair axum handlers
/// return on failure. The message is the error's display form for 4xx
/// conditions; 5xx conditions get a generic message (detail is logged at
/// the call site).
pub fn error_response<E: HttpStatusCode + fmt::Display>(err: &E) -> (StatusCode, String) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        err.to_string()
    };
    (status, message)
}
