use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::booking::{is_valid_email, normalize_email, Booking, NewBookingInput};
use crate::domain::ports::{BookingRepository, EventRepository};
use crate::error::AppError;
use crate::infra::error_mapper::RawStoreError;

pub struct BookingService {
    event_repo: Arc<dyn EventRepository>,
    booking_repo: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub fn new(event_repo: Arc<dyn EventRepository>, booking_repo: Arc<dyn BookingRepository>) -> Self {
        Self { event_repo, booking_repo }
    }

    pub async fn create_booking(&self, input: NewBookingInput) -> Result<Booking, AppError> {
        let event_id = input.event_id.trim();
        if Uuid::parse_str(event_id).is_err() {
            return Err(AppError::validation_field("Invalid event ID format", "eventId"));
        }
        if input.slug.trim().is_empty() {
            return Err(AppError::validation_field("Slug is required", "slug"));
        }

        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AppError::validation_field("Please enter a valid email address", "email"));
        }

        if self.event_repo.find_by_id(event_id).await?.is_none() {
            return Err(AppError::EventReferenceMissing);
        }

        if self.booking_repo.find_by_event_and_email(event_id, &email).await?.is_some() {
            return Err(AppError::AlreadyBooked);
        }

        let booking = Booking::new(event_id.to_string(), email);
        let created = self.booking_repo.create(&booking).await.map_err(|e| match e {
            // Lost a race with a concurrent request; the store constraints decide.
            AppError::Database(db_err) => {
                let raw = RawStoreError::from(&db_err);
                if raw.is_unique_violation() {
                    warn!(event_id = %booking.event_id, "duplicate booking rejected by store");
                    AppError::AlreadyBooked
                } else if raw.is_foreign_key_violation() {
                    AppError::EventReferenceMissing
                } else {
                    AppError::Database(db_err)
                }
            }
            other => other,
        })?;

        info!(booking_id = %created.id, event_id = %created.event_id, slug = %input.slug, "booking created");
        Ok(created)
    }

    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_by_event(event_id).await
    }
}
