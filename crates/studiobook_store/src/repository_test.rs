#[cfg(test)]
mod tests {
    use crate::models::{BookingKind, LineItem, NewBooking, PaymentStatus};
    use crate::repository::SqlBookingRepository;
    use crate::DbClient;
    use chrono::NaiveDate;

    async fn test_repo() -> SqlBookingRepository {
        let path = std::env::temp_dir().join(format!(
            "studiobook-store-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let url = format!("sqlite://{}", path.display());
        let client = DbClient::from_url(&url).await.expect("pool");
        let repo = SqlBookingRepository::new(client);
        repo.init_schema().await.expect("schema");
        repo
    }

    fn studio_booking(items: Vec<LineItem>, subtotal: i64, estimated_total: i64) -> NewBooking {
        NewBooking {
            kind: BookingKind::Studio,
            resource: "studio-a".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            start_time: "11:00 AM".to_string(),
            end_time: "1:00 PM".to_string(),
            items,
            subtotal,
            estimated_total,
            customer_name: "Dana Miller".to_string(),
            customer_email: "dana@example.com".to_string(),
            customer_phone: "+41790000000".to_string(),
        }
    }

    fn two_hours() -> Vec<LineItem> {
        vec![LineItem {
            name: "Recording session".to_string(),
            quantity: 2,
            price: 100,
        }]
    }

    #[tokio::test]
    async fn create_persists_recomputed_total() {
        let repo = test_repo().await;

        let created = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();
        assert_eq!(created.estimated_total, 200);
        assert_eq!(created.payment_status, PaymentStatus::Pending);
        assert!(created.calendar_event_id.is_none());

        let fetched = repo.find(&created.id).await.unwrap().expect("stored");
        assert_eq!(fetched.estimated_total, 200);
        assert_eq!(fetched.subtotal, 200);
        assert_eq!(fetched.items, two_hours());
        assert_eq!(fetched.start_time, "11:00 AM");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn create_rejects_total_mismatch_and_persists_nothing() {
        let repo = test_repo().await;

        let result = repo.create(studio_booking(two_hours(), 200, 199)).await;
        assert!(matches!(
            result,
            Err(crate::DbError::TotalMismatch { expected: 200, supplied: 199 })
        ));

        assert!(repo.list(BookingKind::Studio).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_subtotal_mismatch() {
        let repo = test_repo().await;

        let result = repo.create(studio_booking(two_hours(), 150, 200)).await;
        assert!(matches!(result, Err(crate::DbError::TotalMismatch { .. })));
        assert!(repo.list(BookingKind::Studio).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_partitioned_by_kind() {
        let repo = test_repo().await;

        repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();
        let mut service = studio_booking(two_hours(), 200, 200);
        service.kind = BookingKind::Service;
        service.resource = "mastering".to_string();
        repo.create(service).await.unwrap();

        assert_eq!(repo.list(BookingKind::Studio).await.unwrap().len(), 1);
        let services = repo.list(BookingKind::Service).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].resource, "mastering");
    }

    #[tokio::test]
    async fn delete_missing_returns_false_and_leaves_store_unchanged() {
        let repo = test_repo().await;
        let created = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();

        assert!(!repo.delete("no-such-id").await.unwrap());
        assert_eq!(repo.list(BookingKind::Studio).await.unwrap().len(), 1);

        assert!(repo.delete(&created.id).await.unwrap());
        assert!(repo.list(BookingKind::Studio).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_paid_transitions_pending_only_once() {
        let repo = test_repo().await;
        let created = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();

        assert!(repo.mark_paid(&created.id).await.unwrap());
        let paid = repo.find(&created.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Success);

        // Already success: no further transition
        assert!(!repo.mark_paid(&created.id).await.unwrap());
        assert!(!repo.mark_paid("no-such-id").await.unwrap());
    }

    #[tokio::test]
    async fn calendar_event_id_is_set_at_most_once() {
        let repo = test_repo().await;
        let created = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();

        assert!(repo.attach_calendar_event(&created.id, "evt-1").await.unwrap());
        // Second attach is refused by the guard
        assert!(!repo.attach_calendar_event(&created.id, "evt-2").await.unwrap());

        let stored = repo.find(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.calendar_event_id.as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn date_repair_shifts_only_rows_with_events_and_is_not_idempotent() {
        let repo = test_repo().await;

        let synced = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();
        repo.attach_calendar_event(&synced.id, "evt-synced").await.unwrap();

        let unsynced = repo.create(studio_booking(two_hours(), 200, 200)).await.unwrap();

        let report = repo.shift_event_dates(1).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.fixed, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(report.sample.len(), 1);
        assert_eq!(report.sample[0].before, "2025-06-10");
        assert_eq!(report.sample[0].after, "2025-06-11");

        // Running the batch again shifts the same row a second time: the
        // operation is a migration hammer, not a converging fix.
        repo.shift_event_dates(1).await.unwrap();
        let shifted = repo.find(&synced.id).await.unwrap().unwrap();
        assert_eq!(shifted.start_date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());

        let untouched = repo.find(&unsynced.id).await.unwrap().unwrap();
        assert_eq!(untouched.start_date, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    }

    #[tokio::test]
    async fn watch_state_roundtrip_and_replace() {
        let repo = test_repo().await;
        assert!(repo.watch_state().await.unwrap().is_none());

        repo.save_watch_state("chan-1", "res-1", "2025-06-01T00:00:00+00:00")
            .await
            .unwrap();
        let first = repo.watch_state().await.unwrap().expect("registered");
        assert_eq!(first.channel_id, "chan-1");

        repo.save_watch_state("chan-2", "res-2", "2025-07-01T00:00:00+00:00")
            .await
            .unwrap();
        let replaced = repo.watch_state().await.unwrap().expect("registered");
        assert_eq!(replaced.channel_id, "chan-2");
        assert_eq!(replaced.expiration, "2025-07-01T00:00:00+00:00");
    }
}
