#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use studiobook_config::{AppConfig, GcalConfig, ServerConfig};
    use studiobook_store::SqlBookingRepository;

    use crate::handlers::BookingsState;
    use crate::routes::routes;
    use crate::test_support::{session, test_repo, MockCalendarService, MockPaymentProvider};

    struct TestApp {
        router: Router,
        repo: Arc<SqlBookingRepository>,
        payments: Arc<MockPaymentProvider>,
        #[allow(dead_code)]
        calendar: Arc<MockCalendarService>,
    }

    async fn test_app() -> TestApp {
        let repo = Arc::new(test_repo().await);
        let calendar = Arc::new(MockCalendarService::new());
        let payments = Arc::new(MockPaymentProvider::new());

        let config = Arc::new(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            use_stripe: true,
            use_gcal: true,
            database: None,
            stripe: None,
            gcal: Some(GcalConfig {
                key_path: None,
                calendar_id: Some("studio-calendar".to_string()),
                time_zone: Some("Europe/Zurich".to_string()),
            }),
        });

        let state = Arc::new(BookingsState {
            config,
            repo: repo.clone(),
            calendar: Some(calendar.clone()),
            payments: Some(payments.clone()),
        });

        TestApp {
            router: routes(state),
            repo,
            payments,
            calendar,
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn studio_booking_body(estimated_total: i64) -> Value {
        json!({
            "studio": "studio-a",
            "startDate": "2025-07-15",
            "startTime": "11:00 AM",
            "endTime": "1:00 PM",
            "items": [{"name": "Recording session", "quantity": 2, "price": 100}],
            "subtotal": 200,
            "estimatedTotal": estimated_total,
            "customerName": "Dana Miller",
            "customerEmail": "dana@example.com",
            "customerPhone": "+41790000000"
        })
    }

    #[tokio::test]
    async fn creating_a_booking_returns_201_with_the_stored_record() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/booking", studio_booking_body(200)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["estimatedTotal"], 200);
        assert_eq!(body["paymentStatus"], "pending");
        assert_eq!(body["startDate"], "2025-07-15");
        assert_eq!(body["startTime"], "11:00 AM");
        assert!(body["calendarEventId"].is_null());
    }

    #[tokio::test]
    async fn total_mismatch_is_rejected_and_nothing_is_stored() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/booking", studio_booking_body(199)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.router.clone().oneshot(get("/booking")).await.unwrap();
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn list_responses_disable_caching() {
        let app = test_app().await;

        let response = app.router.clone().oneshot(get("/booking")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cache_control.contains("no-store"), "got {:?}", cache_control);
    }

    #[tokio::test]
    async fn delete_requires_id_and_rejects_unknown_ids() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/booking")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/booking?id=no-such-booking")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn service_bookings_carry_the_type_discriminator() {
        let app = test_app().await;

        let body = json!({
            "service": "mastering",
            "startDate": "2025-07-16",
            "startTime": "2:00 PM",
            "endTime": "3:00 PM",
            "services": [{"name": "Mastering", "quantity": 1, "price": 5000}],
            "subtotal": 5000,
            "estimatedTotal": 5000,
            "customerName": "Dana Miller",
            "customerEmail": "dana@example.com",
            "customerPhone": "+41790000000"
        });
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/service-bookings", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .router
            .clone()
            .oneshot(get("/service-bookings"))
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed[0]["bookingType"], "service");
        assert_eq!(listed[0]["service"], "mastering");
        assert!(listed[0]["services"].is_array());
    }

    #[tokio::test]
    async fn verify_payment_confirms_and_reports_the_calendar_event() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/booking", studio_booking_body(200)))
            .await
            .unwrap();
        let booking_id = body_json(response).await["id"].as_str().unwrap().to_string();

        app.payments.insert(session("cs_1", "paid", Some(&booking_id)));

        let response = app
            .router
            .clone()
            .oneshot(get("/verify-payment?session_id=cs_1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["bookingId"], booking_id.as_str());
        assert_eq!(body["paymentStatus"], "success");
        assert_eq!(body["calendarEventId"], "mock-event-1");
    }

    #[tokio::test]
    async fn verify_payment_requires_a_session_id() {
        let app = test_app().await;
        let response = app
            .router
            .clone()
            .oneshot(get("/verify-payment"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unpaid_sessions_yield_payment_required() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/booking", studio_booking_body(200)))
            .await
            .unwrap();
        let booking_id = body_json(response).await["id"].as_str().unwrap().to_string();
        app.payments.insert(session("cs_1", "unpaid", Some(&booking_id)));

        let response = app
            .router
            .clone()
            .oneshot(get("/verify-payment?session_id=cs_1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn get_session_type_reads_metadata() {
        let app = test_app().await;
        app.payments.insert(session("cs_1", "paid", Some("some-booking")));

        let response = app
            .router
            .clone()
            .oneshot(get("/get-session-type?session_id=cs_1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["bookingType"], "studio");
        assert_eq!(body["sessionId"], "cs_1");
    }

    #[tokio::test]
    async fn fix_booking_dates_reports_shifted_rows() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/booking", studio_booking_body(200)))
            .await
            .unwrap();
        let booking_id = body_json(response).await["id"].as_str().unwrap().to_string();
        app.repo
            .attach_calendar_event(&booking_id, "evt-1")
            .await
            .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/fix-booking-dates")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["processed"], 1);
        assert_eq!(body["fixed"], 1);
        assert_eq!(body["errors"], 0);
        assert_eq!(body["sample"][0]["before"], "2025-07-15");
        assert_eq!(body["sample"][0]["after"], "2025-07-16");
    }

    #[tokio::test]
    async fn calendar_watch_status_tracks_registration_and_expiry() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(get("/calendar-watch-status"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["registered"], false);
        assert_eq!(body["active"], false);

        // Expired registration: recorded but no longer live
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/calendar-watch",
                json!({
                    "channelId": "chan-1",
                    "resourceId": "res-1",
                    "expiration": "2020-01-01T00:00:00+00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(get("/calendar-watch-status"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["registered"], true);
        assert_eq!(body["active"], false);

        // Replaced with a live registration
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/calendar-watch",
                json!({
                    "channelId": "chan-2",
                    "resourceId": "res-2",
                    "expiration": "2099-01-01T00:00:00+00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(get("/calendar-watch-status"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["active"], true);
    }
}
