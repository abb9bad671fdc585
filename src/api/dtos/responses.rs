use serde::Serialize;

use crate::domain::models::{booking::Booking, event::Event};
use crate::error::ErrorCode;

#[derive(Serialize)]
pub struct EventResponse {
    pub message: &'static str,
    pub event: Event,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub message: &'static str,
    pub events: Vec<Event>,
}

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Serialize)]
pub struct BookingErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}
