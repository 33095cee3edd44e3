// --- File: crates/studiobook_common/src/lib.rs ---

pub mod error;    // Error taxonomy
pub mod http;     // HTTP utilities (shared client, response mapping)
pub mod logging;  // Logging setup
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    internal_error, not_found, upstream_error, validation_error, HttpStatusCode, StudiobookError,
};

// Re-export HTTP utilities for easier access
pub use http::{create_client, error_response, HTTP_CLIENT};
