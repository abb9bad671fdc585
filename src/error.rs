use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;
use crate::infra::error_mapper::map_sqlx_error;

/// Stable machine-readable codes carried by every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingSlug,
    InvalidSlug,
    EventNotFound,
    ValidationError,
    MissingImage,
    DuplicateEvent,
    DuplicateKey,
    UploadError,
    CastError,
    InternalServerError,
    AlreadyBooked,
    EventReferenceMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingEvent {
    pub id: String,
    pub slug: String,
}

/// JSON body shared by every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(rename = "keyValue", skip_serializing_if = "Option::is_none")]
    pub key_value: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<ExistingEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            fields: None,
            key_value: None,
            errors: None,
            existing: None,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Missing required route parameter: slug")]
    MissingSlug,
    #[error("{0}")]
    InvalidSlug(String),
    #[error("Event not found for slug: {0}")]
    EventNotFound(String),
    #[error("{message}")]
    Validation { message: String, details: Option<Value> },
    #[error("Image file is required")]
    MissingImage,
    #[error("An event with the same title, date, time, and venue already exists")]
    DuplicateEvent { id: String, slug: String },
    #[error("Image upload failed: {0}")]
    Upload(String),
    #[error("You have already booked this event")]
    AlreadyBooked,
    #[error("Referenced event does not exist")]
    EventReferenceMissing,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation { message: message.into(), details: None }
    }

    pub fn validation_field(message: impl Into<String>, field: &str) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(json!({ "field": field })),
        }
    }

    /// Status and code as seen by the client. Store errors are normalized first.
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Database(e) => match map_sqlx_error(e) {
                Some(mapped) => (mapped.status, mapped.body.code),
                None => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalServerError),
            },
            AppError::MissingSlug => (StatusCode::BAD_REQUEST, ErrorCode::MissingSlug),
            AppError::InvalidSlug(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidSlug),
            AppError::EventNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::EventNotFound),
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::MissingImage => (StatusCode::BAD_REQUEST, ErrorCode::MissingImage),
            AppError::DuplicateEvent { .. } => (StatusCode::CONFLICT, ErrorCode::DuplicateEvent),
            AppError::Upload(_) => (StatusCode::BAD_GATEWAY, ErrorCode::UploadError),
            AppError::AlreadyBooked => (StatusCode::CONFLICT, ErrorCode::AlreadyBooked),
            AppError::EventReferenceMissing => (StatusCode::NOT_FOUND, ErrorCode::EventReferenceMissing),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalServerError),
        }
    }

    pub fn to_body(&self) -> (StatusCode, ErrorBody) {
        let (status, code) = self.status_and_code();
        let body = match self {
            AppError::Database(e) => {
                if let Some(mapped) = map_sqlx_error(e) {
                    return (mapped.status, mapped.body);
                }
                error!("Database error: {:?}", e);
                ErrorBody::new(code, "Internal server error")
                    .with_details(json!({ "error": e.to_string() }))
            }
            AppError::Validation { message, details } => {
                let mut body = ErrorBody::new(code, message.clone());
                body.details = details.clone();
                body
            }
            AppError::DuplicateEvent { id, slug } => {
                let mut body = ErrorBody::new(code, self.to_string());
                body.fields = Some(
                    ["title", "date", "time", "venue"].iter().map(|f| f.to_string()).collect(),
                );
                body.existing = Some(ExistingEvent { id: id.clone(), slug: slug.clone() });
                body
            }
            AppError::Upload(msg) => ErrorBody::new(code, "Image upload failed")
                .with_details(json!({ "error": msg })),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ErrorBody::new(code, "Internal server error")
                    .with_details(json!({ "error": msg }))
            }
            other => ErrorBody::new(code, other.to_string()),
        };
        (status, body)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_body();
        (status, Json(body)).into_response()
    }
}

/// Failures that abort process startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
