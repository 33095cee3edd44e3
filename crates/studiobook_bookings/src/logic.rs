// --- File: crates/studiobook_bookings/src/logic.rs ---
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use studiobook_common::services::{BoxedError, CalendarService, EventSpec, PaymentProvider};
use studiobook_common::{internal_error, not_found, upstream_error, validation_error, StudiobookError};
use studiobook_store::{
    line_items_total, Booking, BookingKind, LineItem, NewBooking, PaymentStatus,
    SqlBookingRepository,
};

/// Zone the studio's wall-clock times are interpreted in when the config
/// does not name one.
pub const DEFAULT_TIME_ZONE: Tz = Tz::Europe__Zurich;

/// Fixed display format for booking times, e.g. "11:00 AM".
const WALL_CLOCK_FORMAT: &str = "%I:%M %p";

// --- Wire format (camelCase, matching the frontend contract) ---

/// Request from the frontend to create a studio booking.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudioBookingRequest {
    pub studio: String,
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

/// Request from the frontend to create a service booking. Same shape as a
/// studio booking with `services` replacing `items`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceBookingRequest {
    pub service: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub services: Vec<LineItem>,
    pub subtotal: i64,
    pub estimated_total: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl CreateStudioBookingRequest {
    pub fn into_new_booking(self) -> Result<NewBooking, StudiobookError> {
        validate_new_booking(
            BookingKind::Studio,
            self.studio,
            self.start_date,
            self.start_time,
            self.end_time,
            self.items,
            self.subtotal,
            self.estimated_total,
            self.customer_name,
            self.customer_email,
            self.customer_phone,
        )
    }
}

impl CreateServiceBookingRequest {
    pub fn into_new_booking(self) -> Result<NewBooking, StudiobookError> {
        validate_new_booking(
            BookingKind::Service,
            self.service,
            self.start_date,
            self.start_time,
            self.end_time,
            self.services,
            self.subtotal,
            self.estimated_total,
            self.customer_name,
            self.customer_email,
            self.customer_phone,
        )
    }
}

/// Validates a creation request and produces the store-level record.
///
/// The monetary invariant is checked here with exact equality: both
/// client-supplied totals must match the recomputed line-item sum, or the
/// request is rejected and nothing is persisted.
#[allow(clippy::too_many_arguments)]
fn validate_new_booking(
    kind: BookingKind,
    resource: String,
    start_date: NaiveDate,
    start_time: String,
    end_time: String,
    items: Vec<LineItem>,
    subtotal: i64,
    estimated_total: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
) -> Result<NewBooking, StudiobookError> {
    let resource_field = match kind {
        BookingKind::Studio => "studio",
        BookingKind::Service => "service",
    };
    require_non_empty(&resource, resource_field)?;
    require_non_empty(&customer_name, "customerName")?;
    require_non_empty(&customer_email, "customerEmail")?;
    require_non_empty(&customer_phone, "customerPhone")?;

    parse_wall_clock(&start_time)?;
    parse_wall_clock(&end_time)?;

    let recomputed = line_items_total(&items);
    if estimated_total != recomputed {
        return Err(validation_error(format!(
            "estimatedTotal {} does not match recomputed total {}",
            estimated_total, recomputed
        )));
    }
    if subtotal != recomputed {
        return Err(validation_error(format!(
            "subtotal {} does not match recomputed total {}",
            subtotal, recomputed
        )));
    }

    Ok(NewBooking {
        kind,
        resource,
        start_date,
        start_time,
        end_time,
        items,
        subtotal,
        estimated_total,
        customer_name,
        customer_email,
        customer_phone,
    })
}

fn require_non_empty(value: &str, field: &str) -> Result<(), StudiobookError> {
    if value.trim().is_empty() {
        return Err(validation_error(format!("{} is required", field)));
    }
    Ok(())
}

/// Parses a wall-clock display string ("11:00 AM") into a naive time.
pub fn parse_wall_clock(value: &str) -> Result<NaiveTime, StudiobookError> {
    NaiveTime::parse_from_str(value.trim(), WALL_CLOCK_FORMAT).map_err(|_| {
        validation_error(format!(
            "invalid time {:?}, expected h:mm AM/PM",
            value
        ))
    })
}

/// Resolves the studio's zone from config, falling back to the default.
pub fn studio_time_zone(zone: Option<&str>) -> Tz {
    zone.and_then(|z| Tz::from_str(z).ok())
        .unwrap_or(DEFAULT_TIME_ZONE)
}

/// Derives the absolute event window for a booking by interpreting its
/// date and wall-clock times as civil time in the studio's zone.
///
/// The conversion is timezone-aware: ambiguous local times (autumn
/// fall-back) resolve to the earlier instant, nonexistent local times
/// (spring-forward gap) are rejected. An end time at or before the start
/// time is taken to cross midnight.
pub fn event_window(
    booking: &Booking,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), StudiobookError> {
    let start_time = parse_wall_clock(&booking.start_time)?;
    let end_time = parse_wall_clock(&booking.end_time)?;

    let start_local = resolve_local(tz, booking.start_date.and_time(start_time))?;
    let end_date = if end_time <= start_time {
        booking.start_date + Duration::days(1)
    } else {
        booking.start_date
    };
    let end_local = resolve_local(tz, end_date.and_time(end_time))?;

    Ok((
        start_local.with_timezone(&Utc),
        end_local.with_timezone(&Utc),
    ))
}

fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, StudiobookError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier),
        LocalResult::None => Err(validation_error(format!(
            "local time {} does not exist in {}",
            naive, tz
        ))),
    }
}

// --- Payment confirmation workflow ---

/// Outcome of a successful payment confirmation.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub booking_id: String,
    pub payment_status: String,
    pub calendar_event_id: Option<String>,
}

/// Confirms a payment session and synchronizes the calendar.
///
/// Payment truth is authoritative, calendar sync is advisory: once the
/// booking is marked paid, a calendar-side fault is logged and the
/// confirmation still succeeds. Re-invoking with the same session id is
/// safe: a booking that already carries a calendar event id is returned
/// as-is without creating a second event.
pub async fn confirm_payment(
    repo: &SqlBookingRepository,
    payments: &Arc<dyn PaymentProvider<Error = BoxedError>>,
    calendar: Option<&Arc<dyn CalendarService<Error = BoxedError>>>,
    calendar_id: Option<&str>,
    tz: Tz,
    session_id: &str,
) -> Result<PaymentConfirmation, StudiobookError> {
    let session = payments
        .fetch_checkout_session(session_id)
        .await
        .map_err(|e| upstream_error("payment provider", e))?
        .ok_or_else(|| not_found(format!("payment session {}", session_id)))?;

    if !session.is_paid() {
        return Err(StudiobookError::PaymentNotCompleted(format!(
            "session {} has payment_status {}",
            session.id,
            session.payment_status.as_deref().unwrap_or("unknown")
        )));
    }

    let booking_id = session
        .metadata
        .get("bookingId")
        .cloned()
        .ok_or_else(|| StudiobookError::MissingMetadata("bookingId".to_string()))?;

    let booking = repo
        .find(&booking_id)
        .await
        .map_err(StudiobookError::from)?
        .ok_or_else(|| not_found(format!("booking {}", booking_id)))?;

    match booking.payment_status {
        PaymentStatus::Pending => {
            repo.mark_paid(&booking_id)
                .await
                .map_err(StudiobookError::from)?;
            info!("Booking {} marked paid via session {}", booking_id, session.id);
        }
        PaymentStatus::Success => {
            info!("Booking {} already paid, re-verification for session {}", booking_id, session.id);
        }
        PaymentStatus::Failed => {
            return Err(internal_error(format!(
                "booking {} is marked failed but session {} is paid",
                booking_id, session.id
            )));
        }
    }

    // Guard: a booking with a calendar event already attached never gets a
    // second one, however many times verification is invoked.
    if let Some(event_id) = booking.calendar_event_id.clone() {
        return Ok(PaymentConfirmation {
            booking_id,
            payment_status: PaymentStatus::Success.as_str().to_string(),
            calendar_event_id: Some(event_id),
        });
    }

    let calendar_event_id = sync_calendar(repo, calendar, calendar_id, tz, &booking).await;

    Ok(PaymentConfirmation {
        booking_id,
        payment_status: PaymentStatus::Success.as_str().to_string(),
        calendar_event_id,
    })
}

/// Best-effort calendar sync for a freshly paid booking. Every failure
/// path logs and returns None; the payment confirmation stands.
async fn sync_calendar(
    repo: &SqlBookingRepository,
    calendar: Option<&Arc<dyn CalendarService<Error = BoxedError>>>,
    calendar_id: Option<&str>,
    tz: Tz,
    booking: &Booking,
) -> Option<String> {
    let (calendar, calendar_id) = match (calendar, calendar_id) {
        (Some(calendar), Some(calendar_id)) => (calendar, calendar_id),
        _ => {
            warn!(
                "Calendar service unavailable, booking {} confirmed without event",
                booking.id
            );
            return None;
        }
    };

    let (start, end) = match event_window(booking, tz) {
        Ok(window) => window,
        Err(e) => {
            warn!("Could not derive event window for booking {}: {}", booking.id, e);
            return None;
        }
    };

    let spec = EventSpec {
        start_time: start,
        end_time: end,
        summary: format!("{} ({})", booking.resource, booking.customer_name),
        description: Some(format!(
            "Booking {} from {} to {}",
            booking.id, booking.start_time, booking.end_time
        )),
    };

    match calendar.create_event(calendar_id, spec).await {
        Ok(created) => match created.event_id {
            Some(event_id) => {
                match repo.attach_calendar_event(&booking.id, &event_id).await {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        "Booking {} already had a calendar event while attaching {}",
                        booking.id, event_id
                    ),
                    Err(e) => warn!(
                        "Failed to store calendar event {} on booking {}: {}",
                        event_id, booking.id, e
                    ),
                }
                Some(event_id)
            }
            None => {
                warn!("Calendar returned no event id for booking {}", booking.id);
                None
            }
        },
        Err(e) => {
            warn!(
                "Calendar sync failed for booking {}: {}. Payment confirmation stands.",
                booking.id, e
            );
            None
        }
    }
}

/// Outcome of a cancellation.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    /// Whether the external calendar event was removed as well.
    pub deleted_calendar_event: bool,
}

/// Deletes a booking, removing its calendar event best-effort first.
///
/// A calendar-side failure is logged and never blocks the booking
/// deletion: the stored booking is authoritative, the event is not.
pub async fn cancel_booking(
    repo: &SqlBookingRepository,
    calendar: Option<&Arc<dyn CalendarService<Error = BoxedError>>>,
    calendar_id: Option<&str>,
    kind: BookingKind,
    id: &str,
) -> Result<CancellationOutcome, StudiobookError> {
    let booking = repo
        .find(id)
        .await
        .map_err(StudiobookError::from)?
        .filter(|b| b.kind == kind)
        .ok_or_else(|| not_found(format!("booking {}", id)))?;

    let deleted_calendar_event = if let Some(event_id) = &booking.calendar_event_id {
        match (calendar, calendar_id) {
            (Some(calendar), Some(calendar_id)) => {
                match calendar.delete_event(calendar_id, event_id).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            "Failed to delete calendar event {} for booking {}: {}. Removing booking anyway.",
                            event_id, id, e
                        );
                        false
                    }
                }
            }
            _ => {
                warn!(
                    "Calendar service unavailable, booking {} deleted without event cleanup",
                    id
                );
                false
            }
        }
    } else {
        false
    };

    let removed = repo.delete(id).await.map_err(StudiobookError::from)?;
    if !removed {
        return Err(not_found(format!("booking {}", id)));
    }

    Ok(CancellationOutcome {
        deleted_calendar_event,
    })
}

/// Looks up the booking category recorded in a payment session's metadata.
pub async fn session_booking_type(
    payments: &Arc<dyn PaymentProvider<Error = BoxedError>>,
    session_id: &str,
) -> Result<String, StudiobookError> {
    let session = payments
        .fetch_checkout_session(session_id)
        .await
        .map_err(|e| upstream_error("payment provider", e))?
        .ok_or_else(|| not_found(format!("payment session {}", session_id)))?;

    session
        .metadata
        .get("bookingType")
        .cloned()
        .ok_or_else(|| StudiobookError::MissingMetadata("bookingType".to_string()))
}

// --- Response shapes ---

/// Studio booking as returned over the wire.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StudioBookingView {
    pub id: String,
    pub studio: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub estimated_total: i64,
    pub payment_status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    pub created_at: String,
}

impl From<Booking> for StudioBookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            studio: b.resource,
            start_date: b.start_date,
            start_time: b.start_time,
            end_time: b.end_time,
            items: b.items,
            subtotal: b.subtotal,
            estimated_total: b.estimated_total,
            payment_status: b.payment_status.as_str().to_string(),
            customer_name: b.customer_name,
            customer_email: b.customer_email,
            customer_phone: b.customer_phone,
            calendar_event_id: b.calendar_event_id,
            created_at: b.created_at,
        }
    }
}

/// Service booking as returned over the wire: the kind discriminator is
/// injected into every record and the line items are named `services`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBookingView {
    pub id: String,
    pub booking_type: String,
    pub service: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub services: Vec<LineItem>,
    pub subtotal: i64,
    pub estimated_total: i64,
    pub payment_status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    pub created_at: String,
}

impl From<Booking> for ServiceBookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            booking_type: BookingKind::Service.as_str().to_string(),
            service: b.resource,
            start_date: b.start_date,
            start_time: b.start_time,
            end_time: b.end_time,
            services: b.items,
            subtotal: b.subtotal,
            estimated_total: b.estimated_total,
            payment_status: b.payment_status.as_str().to_string(),
            customer_name: b.customer_name,
            customer_email: b.customer_email,
            customer_phone: b.customer_phone,
            calendar_event_id: b.calendar_event_id,
            created_at: b.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub booking_id: String,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CancellationResponse {
    pub success: bool,
    pub message: String,
    pub deleted_calendar_event: bool,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SessionTypeResponse {
    pub session_id: String,
    pub booking_type: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusResponse {
    pub registered: bool,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWatchRequest {
    pub channel_id: String,
    pub resource_id: String,
    /// RFC 3339 expiry of the watch channel.
    pub expiration: String,
}
