// --- File: crates/studiobook_bookings/src/doc.rs ---
//! OpenAPI documentation for the booking API (openapi feature only).

use crate::logic::{
    CancellationResponse, SessionTypeResponse, VerifyPaymentResponse, WatchStatusResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::verify_payment_handler,
        crate::handlers::get_session_type_handler,
        crate::handlers::calendar_watch_status_handler,
    ),
    components(schemas(
        VerifyPaymentResponse,
        SessionTypeResponse,
        WatchStatusResponse,
        CancellationResponse,
    )),
    tags(
        (name = "Payments", description = "Payment verification endpoints"),
        (name = "Admin", description = "Administrative endpoints")
    )
)]
pub struct BookingsApiDoc;
