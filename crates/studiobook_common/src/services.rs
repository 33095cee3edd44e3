// --- File: crates/studiobook_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! The booking workflow talks to the calendar service and the payment
//! processor through these traits so the workflow logic can be exercised
//! against in-memory implementations in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for
/// Box<dyn std::error::Error + Send + Sync>.
///
/// Implementations box their concrete error at the trait boundary
/// (`BoxedError(Box::new(err))`) so callers can hold
/// `Arc<dyn CalendarService<Error = BoxedError>>` without per-service
/// adapter types.
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for calendar service operations.
///
/// Exactly the two operations the booking workflow performs: one event
/// created per verified payment, one deleted per cancellation. Both are
/// single remote calls with no retry; callers treat failures as advisory.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: StdError + Send + Sync + 'static;

    /// Create a calendar event, returning its external identifier.
    fn create_event(
        &self,
        calendar_id: &str,
        event: EventSpec,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error>;

    /// Delete a calendar event. Deleting an event that no longer exists
    /// is a success.
    fn delete_event(&self, calendar_id: &str, event_id: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// A trait for payment processor session lookups.
///
/// The processor is the source of truth for payment state; the workflow
/// only ever asks it whether a checkout session is paid and what booking
/// it references.
pub trait PaymentProvider: Send + Sync {
    /// Error type returned by payment provider operations.
    type Error: StdError + Send + Sync + 'static;

    /// Retrieve a checkout session by its opaque identifier. `Ok(None)`
    /// means the processor does not know the session.
    fn fetch_checkout_session(
        &self,
        session_id: &str,
    ) -> BoxFuture<'_, Option<CheckoutSession>, Self::Error>;
}

/// Parameters for a calendar event, already resolved to absolute instants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub summary: String,
    pub description: Option<String>,
}

/// Result of creating a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    /// The external identifier of the event.
    pub event_id: Option<String>,
    /// The status reported by the calendar service, e.g. "confirmed".
    pub status: String,
}

/// Provider-neutral view of a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// e.g. "paid", "unpaid", "no_payment_required"
    pub payment_status: Option<String>,
    /// e.g. "open", "complete", "expired"
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub customer_details: Option<SessionCustomer>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

impl CheckoutSession {
    /// Whether the processor reports the session as fully paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCustomer {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}
