// --- File: crates/studiobook_stripe/src/logic.rs ---
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env};
use tracing::{error, info};

use crate::error::StripeError;

// Import the shared HTTP client from studiobook_common
use studiobook_common::HTTP_CLIENT;

// --- Data Structures ---

/// Response FROM the Stripe API when retrieving a Checkout Session.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StripeCheckoutSessionData {
    pub id: String,
    pub object: String, // "checkout.session"
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer: Option<String>,
    pub customer_details: Option<StripeCustomerDetails>,
    pub metadata: Option<HashMap<String, String>>,
    pub payment_intent: Option<String>,
    pub payment_status: Option<String>, // e.g., "paid", "unpaid", "no_payment_required"
    pub status: Option<String>,         // e.g., "open", "complete", "expired"
    pub client_reference_id: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl StripeCheckoutSessionData {
    /// Whether the processor reports full payment for this session.
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// Look up a metadata value by key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// The booking id linked to this session via metadata.
    pub fn booking_id(&self) -> Result<&str, StripeError> {
        self.metadata_value("bookingId")
            .ok_or_else(|| StripeError::MissingMetadata("bookingId".to_string()))
    }

    /// The booking category recorded on this session via metadata.
    pub fn booking_type(&self) -> Result<&str, StripeError> {
        self.metadata_value("bookingType")
            .ok_or_else(|| StripeError::MissingMetadata("bookingType".to_string()))
    }
}

// --- Core Logic Functions ---

/// Retrieves details of a Stripe Checkout Session.
pub async fn get_checkout_session_details(
    session_id: &str,
) -> Result<StripeCheckoutSessionData, StripeError> {
    info!(
        "[Stripe Logic] Retrieving Checkout Session details for ID: {}",
        session_id
    );

    let stripe_secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| StripeError::ConfigError)?;

    let api_url = format!("https://api.stripe.com/v1/checkout/sessions/{}", session_id);

    let response = HTTP_CLIENT
        .get(&api_url)
        .basic_auth(stripe_secret_key, None::<&str>)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        let session_data: StripeCheckoutSessionData = serde_json::from_str(&body_text)?;
        if !session_data.is_paid() && session_data.status.as_deref() != Some("complete") {
            // User may hit the confirmation flow while payment is still
            // processing, or after it failed
            info!(
                "[Stripe Logic] Checkout session {} status is {:?}, payment_status is {:?}.",
                session_id, session_data.status, session_data.payment_status
            );
        }
        Ok(session_data)
    } else {
        let error_message = extract_error_message(&body_text);
        error!(
            "[Stripe Logic] Failed to retrieve session {}: {} - {}",
            session_id, status, error_message
        );
        Err(StripeError::ApiError {
            status_code: status.as_u16(),
            message: error_message,
        })
    }
}

/// Pulls the human-readable message out of Stripe's error envelope,
/// falling back to the raw body.
pub(crate) fn extract_error_message(body_text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body_text)
            .to_string(),
        Err(_) => body_text.to_string(),
    }
}
