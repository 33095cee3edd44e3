// --- File: crates/studiobook_gcal/src/service.rs ---
//! Google Calendar implementation of the calendar sync adapter.
//!
//! Two operations only: one event inserted per verified payment, one
//! deleted per cancellation. Both are single remote calls with no retry;
//! callers treat failures as advisory.

use std::sync::Arc;

use google_calendar3::api::{Event, EventDateTime};
use studiobook_common::services::{
    BoxFuture, BoxedError, CalendarService, CreatedEvent, EventSpec,
};
use thiserror::Error;
use tracing::warn;

use crate::auth::HubType;

/// Errors that can occur when talking to Google Calendar.
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
}

/// Calendar sync adapter backed by the Google Calendar API.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = BoxedError;

    fn create_event(
        &self,
        calendar_id: &str,
        event: EventSpec,
    ) -> BoxFuture<'_, CreatedEvent, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let new_event = Event {
                summary: Some(event.summary),
                description: event.description,
                start: Some(EventDateTime {
                    date_time: Some(event.start_time),
                    time_zone: Some("UTC".to_string()), // Event times are stored in UTC
                    ..Default::default()
                }),
                end: Some(EventDateTime {
                    date_time: Some(event.end_time),
                    time_zone: Some("UTC".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };

            let (_response, created) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .doit()
                .await
                .map_err(|e| BoxedError(Box::new(GcalError::ApiError(e))))?;

            Ok(CreatedEvent {
                event_id: created.id,
                status: created.status.unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }

    fn delete_event(&self, calendar_id: &str, event_id: &str) -> BoxFuture<'_, (), Self::Error> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            match calendar_hub
                .events()
                .delete(&calendar_id, &event_id)
                .doit()
                .await
            {
                Ok(_) => Ok(()),
                // The event being gone is what the caller wanted
                Err(e) if e.to_string().contains("404") => {
                    warn!("Calendar event {} already gone, treating delete as success", event_id);
                    Ok(())
                }
                Err(e) => Err(BoxedError(Box::new(GcalError::ApiError(e)))),
            }
        })
    }
}
