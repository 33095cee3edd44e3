#[cfg(test)]
mod tests {
    use crate::error::StripeError;
    use crate::logic::{extract_error_message, StripeCheckoutSessionData};

    fn paid_session_json() -> &'static str {
        r#"{
            "id": "cs_test_a1b2c3",
            "object": "checkout.session",
            "amount_total": 20000,
            "currency": "chf",
            "customer": null,
            "customer_details": {
                "email": "dana@example.com",
                "name": "Dana Miller",
                "phone": "+41790000000"
            },
            "metadata": {
                "bookingId": "5f1e9b3a-aaaa-bbbb-cccc-000000000001",
                "bookingType": "studio"
            },
            "payment_intent": "pi_3abc",
            "payment_status": "paid",
            "status": "complete",
            "client_reference_id": null
        }"#
    }

    #[test]
    fn parses_paid_session_with_metadata() {
        let session: StripeCheckoutSessionData =
            serde_json::from_str(paid_session_json()).expect("valid session JSON");

        assert!(session.is_paid());
        assert_eq!(
            session.booking_id().unwrap(),
            "5f1e9b3a-aaaa-bbbb-cccc-000000000001"
        );
        assert_eq!(session.booking_type().unwrap(), "studio");
        assert_eq!(session.amount_total, Some(20000));
    }

    #[test]
    fn unpaid_session_is_not_paid_and_missing_keys_surface() {
        let session: StripeCheckoutSessionData = serde_json::from_str(
            r#"{
                "id": "cs_test_unpaid",
                "object": "checkout.session",
                "amount_total": null,
                "currency": null,
                "customer": null,
                "customer_details": null,
                "metadata": null,
                "payment_intent": null,
                "payment_status": "unpaid",
                "status": "open",
                "client_reference_id": null
            }"#,
        )
        .unwrap();

        assert!(!session.is_paid());
        assert!(matches!(
            session.booking_id(),
            Err(StripeError::MissingMetadata(key)) if key == "bookingId"
        ));
    }

    #[test]
    fn error_envelope_message_is_extracted() {
        let body = r#"{"error": {"message": "No such checkout.session: 'cs_x'", "type": "invalid_request_error"}}"#;
        assert_eq!(
            extract_error_message(body),
            "No such checkout.session: 'cs_x'"
        );

        // Non-JSON bodies fall through untouched
        assert_eq!(extract_error_message("gateway timeout"), "gateway timeout");
    }
}
