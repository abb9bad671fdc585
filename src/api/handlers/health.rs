use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;

use crate::api::dtos::responses::HealthResponse;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.db.backend();
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok", database })),
        Err(e) => {
            error!("health check: database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "unavailable", database }))
        }
    }
}
