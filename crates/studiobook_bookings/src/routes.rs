// --- File: crates/studiobook_bookings/src/routes.rs ---

use crate::handlers::{
    calendar_watch_status_handler, create_service_booking_handler,
    create_studio_booking_handler, delete_service_booking_handler,
    delete_studio_booking_handler, fix_booking_dates_handler, get_session_type_handler,
    list_service_bookings_handler, list_studio_bookings_handler,
    register_calendar_watch_handler, verify_payment_handler, BookingsState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all booking, payment-verification and
/// administrative routes.
pub fn routes(state: Arc<BookingsState>) -> Router {
    Router::new()
        .route(
            "/booking",
            post(create_studio_booking_handler)
                .get(list_studio_bookings_handler)
                .delete(delete_studio_booking_handler),
        )
        .route(
            "/service-bookings",
            post(create_service_booking_handler)
                .get(list_service_bookings_handler)
                .delete(delete_service_booking_handler),
        )
        .route("/verify-payment", get(verify_payment_handler))
        .route("/get-session-type", get(get_session_type_handler))
        .route("/fix-booking-dates", post(fix_booking_dates_handler))
        .route("/calendar-watch-status", get(calendar_watch_status_handler))
        .route("/calendar-watch", post(register_calendar_watch_handler))
        .with_state(state)
}
