use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::api::dtos::responses::{BookingCreatedResponse, BookingErrorResponse};
use crate::domain::models::booking::NewBookingInput;
use crate::error::AppError;
use crate::state::AppState;

/// Booking errors use the `{success, error, code}` envelope instead of the
/// shared error body.
fn booking_error(e: AppError) -> Response {
    let (status, body) = e.to_body();
    if status.is_server_error() {
        warn!("create_booking failed: {}", e);
    }
    (
        status,
        Json(BookingErrorResponse { success: false, error: body.message, code: body.code }),
    )
        .into_response()
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    payload: Result<Json<NewBookingInput>, JsonRejection>,
) -> Response {
    let mut input = match payload {
        Ok(Json(input)) => input,
        Err(e) => return booking_error(AppError::validation(e.body_text())),
    };
    input.slug = slug;

    match state.booking_service.create_booking(input).await {
        Ok(booking) => (
            StatusCode::CREATED,
            Json(BookingCreatedResponse { success: true, booking }),
        )
            .into_response(),
        Err(e) => booking_error(e),
    }
}
