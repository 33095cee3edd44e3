//! In-memory doubles and fixtures shared by the booking tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use studiobook_common::services::{
    BoxFuture, BoxedError, CalendarService, CheckoutSession, CreatedEvent, EventSpec,
    PaymentProvider,
};
use studiobook_store::{BookingKind, DbClient, LineItem, NewBooking, SqlBookingRepository};

#[derive(Debug)]
pub struct MockFailure(pub &'static str);

impl std::fmt::Display for MockFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockFailure {}

/// Calendar double recording every call; can be switched to fail.
pub struct MockCalendarService {
    pub created: Mutex<Vec<EventSpec>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockCalendarService {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

impl CalendarService for MockCalendarService {
    type Error = BoxedError;

    fn create_event(
        &self,
        _calendar_id: &str,
        event: EventSpec,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        Box::pin(async move {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(BoxedError(Box::new(MockFailure("calendar insert failed"))));
            }
            let mut created = self.created.lock().unwrap();
            created.push(event);
            Ok(CreatedEvent {
                event_id: Some(format!("mock-event-{}", created.len())),
                status: "confirmed".to_string(),
            })
        })
    }

    fn delete_event(&self, _calendar_id: &str, event_id: &str) -> BoxFuture<'_, (), Self::Error> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(BoxedError(Box::new(MockFailure("calendar delete failed"))));
            }
            self.deleted.lock().unwrap().push(event_id);
            Ok(())
        })
    }
}

/// Payment processor double serving sessions from a map.
pub struct MockPaymentProvider {
    pub sessions: Mutex<HashMap<String, CheckoutSession>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }
}

impl PaymentProvider for MockPaymentProvider {
    type Error = BoxedError;

    fn fetch_checkout_session(
        &self,
        session_id: &str,
    ) -> BoxFuture<'_, Option<CheckoutSession>, Self::Error> {
        let session_id = session_id.to_string();
        Box::pin(async move { Ok(self.sessions.lock().unwrap().get(&session_id).cloned()) })
    }
}

/// A session in the given payment state, linked to a booking via metadata.
pub fn session(id: &str, payment_status: &str, booking_id: Option<&str>) -> CheckoutSession {
    let mut metadata = HashMap::new();
    if let Some(booking_id) = booking_id {
        metadata.insert("bookingId".to_string(), booking_id.to_string());
        metadata.insert("bookingType".to_string(), "studio".to_string());
    }
    CheckoutSession {
        id: id.to_string(),
        payment_status: Some(payment_status.to_string()),
        status: Some(
            (if payment_status == "paid" { "complete" } else { "open" }).to_string(),
        ),
        metadata,
        customer_details: None,
        amount_total: Some(20000),
        currency: Some("chf".to_string()),
    }
}

pub async fn test_repo() -> SqlBookingRepository {
    let path = std::env::temp_dir().join(format!(
        "studiobook-bookings-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    let url = format!("sqlite://{}", path.display());
    let client = DbClient::from_url(&url).await.expect("pool");
    let repo = SqlBookingRepository::new(client);
    repo.init_schema().await.expect("schema");
    repo
}

pub fn line_items() -> Vec<LineItem> {
    vec![LineItem {
        name: "Recording session".to_string(),
        quantity: 2,
        price: 100,
    }]
}

pub fn new_studio_booking() -> NewBooking {
    NewBooking {
        kind: BookingKind::Studio,
        resource: "studio-a".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
        start_time: "11:00 AM".to_string(),
        end_time: "1:00 PM".to_string(),
        items: line_items(),
        subtotal: 200,
        estimated_total: 200,
        customer_name: "Dana Miller".to_string(),
        customer_email: "dana@example.com".to_string(),
        customer_phone: "+41790000000".to_string(),
    }
}
