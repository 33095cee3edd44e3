//! Booking store for Studiobook.
//!
//! Persists booking records and the calendar watch registration behind a
//! database-agnostic SQLx pool (sqlite by default).

pub mod client;
pub mod error;
pub mod models;
pub mod repository;

#[cfg(test)]
mod repository_test;

pub use client::DbClient;
pub use error::DbError;
pub use models::{
    line_items_total, Booking, BookingKind, CalendarWatch, DateRepairReport, DateRepairSample,
    LineItem, NewBooking, PaymentStatus,
};
pub use repository::SqlBookingRepository;
