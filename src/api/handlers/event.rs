use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::{
    requests::EventForm,
    responses::{EventResponse, EventsResponse},
};
use crate::domain::models::{asset::ImageUpload, event::{EventSort, UpdateEventInput}};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub sort: EventSort,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::validation(format!("Invalid multipart body: {}", e.body_text()))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart
        .map_err(|e| AppError::validation(format!("Expected multipart/form-data: {}", e.body_text())))?;

    let mut form = EventForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            form.image = Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.push_text(&name, value);
        }
    }

    let (input, image) = form.into_parts()?;

    info!("Creating event: {}", input.title.trim());
    let event = state.event_service.create_event(input, image).await?;

    Ok((StatusCode::CREATED, Json(EventResponse { message: "Event created successfully", event })))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::validation_field(e.body_text(), "sort"))?;
    let events = state.event_service.list(query.sort).await?;
    Ok(Json(EventsResponse { message: "Events fetched successfully", events }))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.find_by_slug(&slug).await?;
    Ok(Json(EventResponse { message: "Event fetched successfully", event }))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    payload: Result<Json<UpdateEventInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(patch) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let event = state.event_service.update_event(&slug, patch).await?;
    Ok(Json(EventResponse { message: "Event updated successfully", event }))
}

pub async fn similar_events(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let events = state.event_service.similar_to(&slug).await;
    Json(EventsResponse { message: "Similar events fetched successfully", events })
}
