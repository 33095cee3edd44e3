// --- File: crates/studiobook_gcal/src/lib.rs ---
//! Google Calendar sync adapter.

pub mod auth;
pub mod service;

pub use auth::{create_calendar_hub, HubType};
pub use service::{GcalError, GoogleCalendarService};
