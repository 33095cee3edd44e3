// --- File: crates/studiobook_store/src/models.rs ---
//! Record types held by the booking store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which collection a booking record belongs to. Studio bookings carry
/// `items`, service bookings carry `services`; the records are otherwise
/// the same shape, so they share one table with this discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingKind {
    Studio,
    Service,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Studio => "studio",
            BookingKind::Service => "service",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "studio" => Some(BookingKind::Studio),
            "service" => Some(BookingKind::Service),
            _ => None,
        }
    }
}

/// Payment lifecycle state. The only implemented transition is
/// `Pending -> Success`, performed by the payment verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// One line of a booking: a named selection with quantity and unit price
/// in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: i64,
    pub price: i64,
}

/// Recomputes the monetary total of a line-item list. Both `subtotal` and
/// `estimated_total` must equal this sum at creation time.
pub fn line_items_total(items: &[LineItem]) -> i64 {
    items.iter().map(|item| item.quantity * item.price).sum()
}

/// A persisted booking record.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: String,
    pub kind: BookingKind,
    /// The studio or service being booked.
    pub resource: String,
    /// Calendar date of the session, date-only semantics.
    pub start_date: NaiveDate,
    /// Wall-clock display strings, e.g. "11:00 AM".
    pub start_time: String,
    pub end_time: String,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub estimated_total: i64,
    pub payment_status: PaymentStatus,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// Identifier of the externally created calendar event. Set at most
    /// once, and only after the event was durably created.
    pub calendar_event_id: Option<String>,
    /// RFC 3339, set at insert, never updated.
    pub created_at: String,
}

/// Input for creating a booking. The id, status and creation timestamp are
/// minted by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub kind: BookingKind,
    pub resource: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub estimated_total: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

/// One before/after pair from the date-repair batch.
#[derive(Debug, Clone, Serialize)]
pub struct DateRepairSample {
    pub id: String,
    pub before: String,
    pub after: String,
}

/// Outcome of the date-repair batch.
#[derive(Debug, Clone, Serialize)]
pub struct DateRepairReport {
    /// Rows carrying a calendar event id (the batch's selection).
    pub processed: usize,
    /// Rows whose start_date was shifted and persisted.
    pub fixed: usize,
    /// Rows skipped because of a parse or update failure.
    pub errors: usize,
    /// First few before/after pairs, truncated.
    pub sample: Vec<DateRepairSample>,
}

/// The calendar watch registration, one owned row with an expiry instead
/// of an ad hoc state file.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarWatch {
    pub channel_id: String,
    pub resource_id: String,
    /// RFC 3339 expiry of the watch channel.
    pub expiration: String,
    pub updated_at: String,
}
