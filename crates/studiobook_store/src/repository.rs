// --- File: crates/studiobook_store/src/repository.rs ---
//! SQL repository for booking records and the calendar watch row.

use crate::error::DbError;
use crate::models::{
    line_items_total, Booking, BookingKind, CalendarWatch, DateRepairReport, DateRepairSample,
    NewBooking, PaymentStatus,
};
use crate::DbClient;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// SQL implementation of the booking repository.
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }

    /// Create the tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking store schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                resource TEXT NOT NULL,
                start_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                items TEXT NOT NULL,
                subtotal INTEGER NOT NULL,
                estimated_total INTEGER NOT NULL,
                payment_status TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                customer_email TEXT NOT NULL,
                customer_phone TEXT NOT NULL,
                calendar_event_id TEXT UNIQUE,
                created_at TEXT NOT NULL
            )
        "#,
            )
            .await?;

        // Single-row table: the one active watch registration, replaced on
        // re-registration.
        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS calendar_watch (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                channel_id TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                expiration TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
            )
            .await?;

        info!("Booking store schema initialized");
        Ok(())
    }

    /// Insert a new booking in `pending` state.
    ///
    /// The totals invariant is enforced here as well as at the API layer:
    /// the store never accepts a record whose subtotal or estimated total
    /// disagrees with the recomputed line-item sum.
    pub async fn create(&self, new: NewBooking) -> Result<Booking, DbError> {
        let expected = line_items_total(&new.items);
        if new.estimated_total != expected {
            return Err(DbError::TotalMismatch {
                expected,
                supplied: new.estimated_total,
            });
        }
        if new.subtotal != expected {
            return Err(DbError::TotalMismatch {
                expected,
                supplied: new.subtotal,
            });
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            resource: new.resource,
            start_date: new.start_date,
            start_time: new.start_time,
            end_time: new.end_time,
            items: new.items,
            subtotal: new.subtotal,
            estimated_total: new.estimated_total,
            payment_status: PaymentStatus::Pending,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            calendar_event_id: None,
            created_at: Utc::now().to_rfc3339(),
        };

        let items_json = serde_json::to_string(&booking.items)
            .map_err(|e| DbError::DataError(format!("Failed to serialize items: {}", e)))?;

        let query = r#"
            INSERT INTO bookings (
                id, kind, resource, start_date, start_time, end_time,
                items, subtotal, estimated_total, payment_status,
                customer_name, customer_email, customer_phone, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(&booking.id)
            .bind(booking.kind.as_str())
            .bind(&booking.resource)
            .bind(booking.start_date.format("%Y-%m-%d").to_string())
            .bind(&booking.start_time)
            .bind(&booking.end_time)
            .bind(&items_json)
            .bind(booking.subtotal)
            .bind(booking.estimated_total)
            .bind(booking.payment_status.as_str())
            .bind(&booking.customer_name)
            .bind(&booking.customer_email)
            .bind(&booking.customer_phone)
            .bind(&booking.created_at)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        debug!("Created booking {} ({})", booking.id, booking.kind.as_str());
        Ok(booking)
    }

    /// Fetch a booking by id.
    pub async fn find(&self, id: &str) -> Result<Option<Booking>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, resource, start_date, start_time, end_time,
                   items, subtotal, estimated_total, payment_status,
                   customer_name, customer_email, customer_phone,
                   calendar_event_id, created_at
            FROM bookings WHERE id = $1
        "#,
        )
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.map(row_to_booking).transpose()
    }

    /// List all bookings of a kind, newest first. Unfiltered, no
    /// pagination.
    pub async fn list(&self, kind: BookingKind) -> Result<Vec<Booking>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, resource, start_date, start_time, end_time,
                   items, subtotal, estimated_total, payment_status,
                   customer_name, customer_email, customer_phone,
                   calendar_event_id, created_at
            FROM bookings WHERE kind = $1
            ORDER BY created_at DESC
        "#,
        )
        .bind(kind.as_str())
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.into_iter().map(row_to_booking).collect()
    }

    /// Delete a booking. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition a booking from `pending` to `success`. Returns whether a
    /// row transitioned; an already-successful or failed booking is left
    /// untouched.
    pub async fn mark_paid(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE bookings SET payment_status = 'success' \
             WHERE id = $1 AND payment_status = 'pending'",
        )
        .bind(id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the calendar event id on a booking. The guard makes this a
    /// set-at-most-once operation: a booking that already carries an event
    /// id is left untouched and `false` is returned.
    pub async fn attach_calendar_event(
        &self,
        id: &str,
        event_id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE bookings SET calendar_event_id = $1 \
             WHERE id = $2 AND calendar_event_id IS NULL",
        )
        .bind(event_id)
        .bind(id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Administrative batch: shift `start_date` by a fixed day offset on
    /// every booking carrying a calendar event id.
    ///
    /// There is no conditional logic distinguishing which rows actually
    /// need correction, and the operation is NOT idempotent: running it
    /// twice shifts dates twice. Per-row failures are logged and counted,
    /// never fatal.
    pub async fn shift_event_dates(&self, days: i64) -> Result<DateRepairReport, DbError> {
        let rows = sqlx::query(
            "SELECT id, start_date FROM bookings \
             WHERE calendar_event_id IS NOT NULL AND calendar_event_id != ''",
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let mut report = DateRepairReport {
            processed: rows.len(),
            fixed: 0,
            errors: 0,
            sample: Vec::new(),
        };

        for row in rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| DbError::DataError(e.to_string()))?;
            let before: String = row
                .try_get("start_date")
                .map_err(|e| DbError::DataError(e.to_string()))?;

            let parsed = match NaiveDate::parse_from_str(&before, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    warn!("Skipping booking {}: unparseable start_date {:?}: {}", id, before, e);
                    report.errors += 1;
                    continue;
                }
            };
            let after = (parsed + Duration::days(days))
                .format("%Y-%m-%d")
                .to_string();

            match sqlx::query("UPDATE bookings SET start_date = $1 WHERE id = $2")
                .bind(&after)
                .bind(&id)
                .execute(self.db_client.pool())
                .await
            {
                Ok(_) => {
                    report.fixed += 1;
                    if report.sample.len() < 10 {
                        report.sample.push(DateRepairSample { id, before, after });
                    }
                }
                Err(e) => {
                    warn!("Failed to update start_date for booking {}: {}", id, e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Date repair: processed={} fixed={} errors={}",
            report.processed, report.fixed, report.errors
        );
        Ok(report)
    }

    /// Read the calendar watch registration, if one was ever recorded.
    pub async fn watch_state(&self) -> Result<Option<CalendarWatch>, DbError> {
        let row = sqlx::query(
            "SELECT channel_id, resource_id, expiration, updated_at \
             FROM calendar_watch WHERE id = 1",
        )
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.map(|row| {
            Ok(CalendarWatch {
                channel_id: try_column(&row, "channel_id")?,
                resource_id: try_column(&row, "resource_id")?,
                expiration: try_column(&row, "expiration")?,
                updated_at: try_column(&row, "updated_at")?,
            })
        })
        .transpose()
    }

    /// Record or replace the calendar watch registration.
    pub async fn save_watch_state(
        &self,
        channel_id: &str,
        resource_id: &str,
        expiration: &str,
    ) -> Result<CalendarWatch, DbError> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO calendar_watch (id, channel_id, resource_id, expiration, updated_at)
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET
                channel_id = excluded.channel_id,
                resource_id = excluded.resource_id,
                expiration = excluded.expiration,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(channel_id)
        .bind(resource_id)
        .bind(expiration)
        .bind(&updated_at)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(CalendarWatch {
            channel_id: channel_id.to_string(),
            resource_id: resource_id.to_string(),
            expiration: expiration.to_string(),
            updated_at,
        })
    }
}

fn try_column(row: &AnyRow, name: &str) -> Result<String, DbError> {
    row.try_get(name)
        .map_err(|e| DbError::DataError(format!("column {}: {}", name, e)))
}

fn row_to_booking(row: AnyRow) -> Result<Booking, DbError> {
    let kind_raw = try_column(&row, "kind")?;
    let kind = BookingKind::parse(&kind_raw)
        .ok_or_else(|| DbError::DataError(format!("unknown booking kind {:?}", kind_raw)))?;

    let status_raw = try_column(&row, "payment_status")?;
    let payment_status = PaymentStatus::parse(&status_raw)
        .ok_or_else(|| DbError::DataError(format!("unknown payment status {:?}", status_raw)))?;

    let date_raw = try_column(&row, "start_date")?;
    let start_date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d")
        .map_err(|e| DbError::DataError(format!("bad start_date {:?}: {}", date_raw, e)))?;

    let items_json = try_column(&row, "items")?;
    let items = serde_json::from_str(&items_json)
        .map_err(|e| DbError::DataError(format!("bad items JSON: {}", e)))?;

    Ok(Booking {
        id: try_column(&row, "id")?,
        kind,
        resource: try_column(&row, "resource")?,
        start_date,
        start_time: try_column(&row, "start_time")?,
        end_time: try_column(&row, "end_time")?,
        items,
        subtotal: row
            .try_get("subtotal")
            .map_err(|e| DbError::DataError(e.to_string()))?,
        estimated_total: row
            .try_get("estimated_total")
            .map_err(|e| DbError::DataError(e.to_string()))?,
        payment_status,
        customer_name: try_column(&row, "customer_name")?,
        customer_email: try_column(&row, "customer_email")?,
        customer_phone: try_column(&row, "customer_phone")?,
        calendar_event_id: row
            .try_get("calendar_event_id")
            .map_err(|e| DbError::DataError(e.to_string()))?,
        created_at: try_column(&row, "created_at")?,
    })
}
