// File: crates/services/studiobook_backend/src/main.rs
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use studiobook_bookings::{routes as booking_routes, BookingsState};
use studiobook_common::services::{BoxedError, CalendarService, PaymentProvider};
use studiobook_config::load_config;
use studiobook_gcal::{create_calendar_hub, GoogleCalendarService};
use studiobook_store::{DbClient, SqlBookingRepository};
use studiobook_stripe::StripePaymentProvider;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/studiobook.db";

#[axum::debug_handler]
async fn health_handler(State(state): State<Arc<BookingsState>>) -> Json<serde_json::Value> {
    let store_healthy = state.repo.client().is_healthy().await;
    Json(serde_json::json!({
        "status": if store_healthy { "ok" } else { "degraded" },
        "store": store_healthy,
        "calendar": state.calendar.is_some(),
        "payments": state.payments.is_some(),
    }))
}

#[tokio::main]
async fn main() {
    studiobook_common::logging::init();

    let config = Arc::new(load_config().expect("Failed to load config"));

    // --- Booking store ---
    let db_client = match config.database.as_ref() {
        Some(db_config) => DbClient::from_config(db_config).await,
        None => DbClient::from_url(DEFAULT_DATABASE_URL).await,
    }
    .expect("Failed to connect to booking store");
    let repo = Arc::new(SqlBookingRepository::new(db_client));
    repo.init_schema()
        .await
        .expect("Failed to initialize booking store schema");

    // --- Calendar sync (runtime flag; failures degrade, never abort) ---
    let calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>> =
        if config.use_gcal && config.gcal.is_some() {
            match create_calendar_hub(config.gcal.as_ref().unwrap()).await {
                Ok(hub) => {
                    info!("✅ Google Calendar service initialized.");
                    Some(Arc::new(GoogleCalendarService::new(Arc::new(hub))))
                }
                Err(e) => {
                    error!(
                        "🚨 Failed to initialize Google Calendar service: {}. Bookings will not sync.",
                        e
                    );
                    None
                }
            }
        } else {
            info!("ℹ️ Calendar sync disabled via runtime config.");
            None
        };

    // --- Payment verification (runtime flag) ---
    let payments: Option<Arc<dyn PaymentProvider<Error = BoxedError>>> =
        if config.use_stripe && config.stripe.is_some() {
            info!("✅ Stripe payment verification enabled.");
            Some(Arc::new(StripePaymentProvider::new()))
        } else {
            info!("ℹ️ Payment verification disabled via runtime config.");
            None
        };

    let state = Arc::new(BookingsState {
        config: config.clone(),
        repo,
        calendar,
        payments,
    });

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to Studiobook API!" }))
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .merge(booking_routes(state));

    #[allow(unused_mut)] // mutable only when the openapi feature is on
    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use studiobook_bookings::doc::BookingsApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        println!("📖 Adding Swagger UI at /api/docs");
        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", BookingsApiDoc::openapi());
        app = app.merge(swagger_ui);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
