// --- File: crates/studiobook_stripe/src/service.rs ---
//! Stripe implementation of the payment provider abstraction.

use crate::error::StripeError;
use crate::logic::{get_checkout_session_details, StripeCheckoutSessionData};
use studiobook_common::services::{
    BoxFuture, BoxedError, CheckoutSession, PaymentProvider, SessionCustomer,
};

/// Payment provider backed by the Stripe Checkout Sessions API.
pub struct StripePaymentProvider;

impl StripePaymentProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StripePaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentProvider for StripePaymentProvider {
    type Error = BoxedError;

    fn fetch_checkout_session(
        &self,
        session_id: &str,
    ) -> BoxFuture<'_, Option<CheckoutSession>, Self::Error> {
        let session_id = session_id.to_string();

        Box::pin(async move {
            match get_checkout_session_details(&session_id).await {
                Ok(session) => Ok(Some(to_common_session(session))),
                Err(StripeError::ApiError { status_code: 404, .. }) => Ok(None),
                Err(e) => Err(BoxedError(Box::new(e))),
            }
        })
    }
}

fn to_common_session(session: StripeCheckoutSessionData) -> CheckoutSession {
    CheckoutSession {
        id: session.id,
        payment_status: session.payment_status,
        status: session.status,
        metadata: session.metadata.unwrap_or_default(),
        customer_details: session.customer_details.map(|c| SessionCustomer {
            email: c.email,
            name: c.name,
            phone: c.phone,
        }),
        amount_total: session.amount_total,
        currency: session.currency,
    }
}
