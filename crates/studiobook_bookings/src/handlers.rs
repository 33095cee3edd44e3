// --- File: crates/studiobook_bookings/src/handlers.rs ---
use axum::{
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use studiobook_common::services::{BoxedError, CalendarService, PaymentProvider};
use studiobook_common::{error_response, StudiobookError};
use studiobook_config::AppConfig;
use studiobook_store::{BookingKind, DateRepairReport, SqlBookingRepository};

use crate::logic::{
    cancel_booking, confirm_payment, session_booking_type, studio_time_zone, CancellationResponse,
    CreateServiceBookingRequest, CreateStudioBookingRequest, RegisterWatchRequest,
    ServiceBookingView, SessionTypeResponse, StudioBookingView, VerifyPaymentResponse,
    WatchStatusResponse,
};

// Shared state for all booking handlers. The calendar and payment handles
// are absent when the corresponding runtime flag is off; handlers degrade
// per the asymmetric failure policy.
#[derive(Clone)]
pub struct BookingsState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<SqlBookingRepository>,
    pub calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    pub payments: Option<Arc<dyn PaymentProvider<Error = BoxedError>>>,
}

impl BookingsState {
    pub fn time_zone(&self) -> Tz {
        studio_time_zone(
            self.config
                .gcal
                .as_ref()
                .and_then(|g| g.time_zone.as_deref()),
        )
    }

    pub fn calendar_id(&self) -> Option<&str> {
        self.config
            .gcal
            .as_ref()
            .and_then(|g| g.calendar_id.as_deref())
    }
}

/// Logs the failure and maps it to the handler error pair. 4xx conditions
/// carry the error message, 5xx conditions a generic one.
fn map_error(context: &str, err: StudiobookError) -> (StatusCode, String) {
    let (status, message) = error_response(&err);
    if status.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        info!("{}: {}", context, err);
    }
    (status, message)
}

/// List responses must never be cached: admin views rely on always seeing
/// current state.
fn no_cache() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ),
        (header::PRAGMA, HeaderValue::from_static("no-cache")),
        (header::EXPIRES, HeaderValue::from_static("0")),
    ]
}

// --- Studio bookings ---

/// Handler to create a studio booking. Totals are recomputed server-side;
/// a mismatch is rejected before anything is persisted.
#[axum::debug_handler]
pub async fn create_studio_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Json(payload): Json<CreateStudioBookingRequest>,
) -> Result<(StatusCode, Json<StudioBookingView>), (StatusCode, String)> {
    let new = payload
        .into_new_booking()
        .map_err(|e| map_error("Create studio booking", e))?;
    let booking = state
        .repo
        .create(new)
        .await
        .map_err(|e| map_error("Create studio booking", e.into()))?;
    info!("Created studio booking {}", booking.id);
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// Handler to list all studio bookings.
#[axum::debug_handler]
pub async fn list_studio_bookings_handler(
    State(state): State<Arc<BookingsState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bookings = state
        .repo
        .list(BookingKind::Studio)
        .await
        .map_err(|e| map_error("List studio bookings", e.into()))?;
    let views: Vec<StudioBookingView> = bookings.into_iter().map(Into::into).collect();
    Ok((no_cache(), Json(views)))
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DeleteBookingQuery {
    pub id: Option<String>,
}

/// Handler to cancel a studio booking. The calendar event, if any, is
/// removed best-effort first.
#[axum::debug_handler]
pub async fn delete_studio_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Query(query): Query<DeleteBookingQuery>,
) -> Result<Json<CancellationResponse>, (StatusCode, String)> {
    delete_booking(&state, BookingKind::Studio, query).await
}

// --- Service bookings ---

/// Handler to create a service booking.
#[axum::debug_handler]
pub async fn create_service_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Json(payload): Json<CreateServiceBookingRequest>,
) -> Result<(StatusCode, Json<ServiceBookingView>), (StatusCode, String)> {
    let new = payload
        .into_new_booking()
        .map_err(|e| map_error("Create service booking", e))?;
    let booking = state
        .repo
        .create(new)
        .await
        .map_err(|e| map_error("Create service booking", e.into()))?;
    info!("Created service booking {}", booking.id);
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// Handler to list all service bookings, with the `bookingType`
/// discriminator injected into each record.
#[axum::debug_handler]
pub async fn list_service_bookings_handler(
    State(state): State<Arc<BookingsState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bookings = state
        .repo
        .list(BookingKind::Service)
        .await
        .map_err(|e| map_error("List service bookings", e.into()))?;
    let views: Vec<ServiceBookingView> = bookings.into_iter().map(Into::into).collect();
    Ok((no_cache(), Json(views)))
}

/// Handler to cancel a service booking.
#[axum::debug_handler]
pub async fn delete_service_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Query(query): Query<DeleteBookingQuery>,
) -> Result<Json<CancellationResponse>, (StatusCode, String)> {
    delete_booking(&state, BookingKind::Service, query).await
}

async fn delete_booking(
    state: &BookingsState,
    kind: BookingKind,
    query: DeleteBookingQuery,
) -> Result<Json<CancellationResponse>, (StatusCode, String)> {
    let id = query.id.filter(|id| !id.trim().is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "Missing id query parameter".to_string(),
    ))?;

    let outcome = cancel_booking(
        &state.repo,
        state.calendar.as_ref(),
        state.calendar_id(),
        kind,
        &id,
    )
    .await
    .map_err(|e| map_error("Delete booking", e))?;

    info!("Deleted {} booking {}", kind.as_str(), id);
    Ok(Json(CancellationResponse {
        success: true,
        message: "Booking deleted successfully.".to_string(),
        deleted_calendar_event: outcome.deleted_calendar_event,
    }))
}

// --- Payment verification ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PaymentSessionQuery {
    pub session_id: Option<String>,
}

/// Handler for the payment confirmation callback: verifies the session
/// with the processor, marks the booking paid and triggers calendar sync.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/verify-payment",
    params(PaymentSessionQuery),
    responses(
        (status = 200, description = "Payment verified, booking confirmed", body = VerifyPaymentResponse),
        (status = 400, description = "Missing session_id or session metadata"),
        (status = 402, description = "Session is not paid"),
        (status = 404, description = "Unknown session or booking"),
        (status = 502, description = "Payment processor unreachable")
    ),
    tag = "Payments"
))]
pub async fn verify_payment_handler(
    State(state): State<Arc<BookingsState>>,
    Query(query): Query<PaymentSessionQuery>,
) -> Result<Json<VerifyPaymentResponse>, (StatusCode, String)> {
    let session_id = query.session_id.filter(|id| !id.trim().is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "Missing session_id query parameter".to_string(),
    ))?;

    let payments = state.payments.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Payment verification is disabled.".to_string(),
    ))?;

    let confirmation = confirm_payment(
        &state.repo,
        payments,
        state.calendar.as_ref(),
        state.calendar_id(),
        state.time_zone(),
        &session_id,
    )
    .await
    .map_err(|e| map_error("Verify payment", e))?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        booking_id: confirmation.booking_id,
        payment_status: confirmation.payment_status,
        calendar_event_id: confirmation.calendar_event_id,
    }))
}

/// Handler returning the booking category recorded in a payment session's
/// metadata.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/get-session-type",
    params(PaymentSessionQuery),
    responses(
        (status = 200, description = "Booking category for the session", body = SessionTypeResponse),
        (status = 400, description = "Missing session_id or bookingType metadata"),
        (status = 404, description = "Unknown session")
    ),
    tag = "Payments"
))]
pub async fn get_session_type_handler(
    State(state): State<Arc<BookingsState>>,
    Query(query): Query<PaymentSessionQuery>,
) -> Result<Json<SessionTypeResponse>, (StatusCode, String)> {
    let session_id = query.session_id.filter(|id| !id.trim().is_empty()).ok_or((
        StatusCode::BAD_REQUEST,
        "Missing session_id query parameter".to_string(),
    ))?;

    let payments = state.payments.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "Payment verification is disabled.".to_string(),
    ))?;

    let booking_type = session_booking_type(payments, &session_id)
        .await
        .map_err(|e| map_error("Get session type", e))?;

    Ok(Json(SessionTypeResponse {
        session_id,
        booking_type,
    }))
}

// --- Administrative operations ---

/// Handler for the administrative date-repair batch: shifts the start
/// date of every calendar-synced booking by one day.
///
/// Running it twice shifts dates by two days. That is the documented
/// behavior of this migration hammer; it must never be wired to anything
/// automatic.
#[axum::debug_handler]
pub async fn fix_booking_dates_handler(
    State(state): State<Arc<BookingsState>>,
) -> Result<Json<DateRepairReport>, (StatusCode, String)> {
    info!("Running booking date repair (one-day shift)");
    let report = state
        .repo
        .shift_event_dates(1)
        .await
        .map_err(|e| map_error("Fix booking dates", e.into()))?;
    Ok(Json(report))
}

/// Handler reporting whether a calendar watch registration exists and is
/// still live.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/calendar-watch-status",
    responses(
        (status = 200, description = "Watch registration state", body = WatchStatusResponse)
    ),
    tag = "Admin"
))]
pub async fn calendar_watch_status_handler(
    State(state): State<Arc<BookingsState>>,
) -> Result<Json<WatchStatusResponse>, (StatusCode, String)> {
    let watch = state
        .repo
        .watch_state()
        .await
        .map_err(|e| map_error("Calendar watch status", e.into()))?;

    let response = match watch {
        Some(watch) => WatchStatusResponse {
            registered: true,
            active: expiration_is_live(&watch.expiration),
            expiration: Some(watch.expiration),
        },
        None => WatchStatusResponse {
            registered: false,
            active: false,
            expiration: None,
        },
    };
    Ok(Json(response))
}

/// Handler recording (or replacing) the calendar watch registration.
#[axum::debug_handler]
pub async fn register_calendar_watch_handler(
    State(state): State<Arc<BookingsState>>,
    Json(payload): Json<RegisterWatchRequest>,
) -> Result<Json<WatchStatusResponse>, (StatusCode, String)> {
    if payload.channel_id.trim().is_empty() || payload.resource_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "channelId and resourceId are required".to_string(),
        ));
    }
    if DateTime::parse_from_rfc3339(&payload.expiration).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            "expiration must be an RFC 3339 timestamp".to_string(),
        ));
    }

    let saved = state
        .repo
        .save_watch_state(&payload.channel_id, &payload.resource_id, &payload.expiration)
        .await
        .map_err(|e| map_error("Register calendar watch", e.into()))?;

    info!("Calendar watch {} registered until {}", saved.channel_id, saved.expiration);
    Ok(Json(WatchStatusResponse {
        registered: true,
        active: expiration_is_live(&saved.expiration),
        expiration: Some(saved.expiration),
    }))
}

fn expiration_is_live(expiration: &str) -> bool {
    DateTime::parse_from_rfc3339(expiration)
        .map(|exp| exp.with_timezone(&Utc) > Utc::now())
        .unwrap_or(false)
}
