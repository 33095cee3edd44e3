// --- File: crates/studiobook_bookings/src/lib.rs ---
//! Booking API: HTTP handlers for studio and service bookings, the
//! payment-confirmation workflow, and the administrative date-repair and
//! calendar-watch operations.

pub mod handlers;
pub mod logic;
pub mod routes;

#[cfg(feature = "openapi")]
pub mod doc;

#[cfg(test)]
mod handlers_test;
#[cfg(test)]
mod test_support;

pub use handlers::BookingsState;
pub use routes::routes;
