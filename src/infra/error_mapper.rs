//! Normalizes raw store failures into the client-facing error taxonomy.
//!
//! Driver errors are first lowered into a [`RawStoreError`], which keeps only the
//! signals the mapping needs: the driver code, the message, an optional key/value
//! map of the colliding values, and per-item errors for bulk writes.

use axum::http::StatusCode;
use regex::Regex;
use serde_json::json;
use sqlx::postgres::PgDatabaseError;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{ErrorBody, ErrorCode};

// SQLite extended result codes and Postgres SQLSTATEs. 11000/11001 are the
// document-store duplicate-key codes, still produced by imported error payloads.
const UNIQUE_VIOLATION: &[&str] = &["2067", "1555", "23505", "11000", "11001"];
const CONSTRAINT_VALIDATION: &[&str] = &["275", "1299", "23514", "23502"];
const INVALID_VALUE: &[&str] = &["22P02", "22007", "22008"];
const FOREIGN_KEY_VIOLATION: &[&str] = &["787", "23503"];

pub const PLACEHOLDER_FIELD: &str = "unique field";

static SQLITE_UNIQUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"UNIQUE constraint failed:\s*(.+)$").expect("valid regex"));
static KEY_DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Key \(([^)]+)\)=\((.*)\)").expect("valid regex"));
static DUP_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)dup key:\s*\{\s*([^}]+?)\s*\}").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawErrorKind {
    #[default]
    Database,
    Validation(Vec<String>),
    Cast { path: Option<String>, value: Option<String> },
}

#[derive(Debug, Clone, Default)]
pub struct RawStoreError {
    pub code: Option<String>,
    pub message: String,
    pub key_value: Option<BTreeMap<String, String>>,
    pub write_errors: Vec<RawStoreError>,
    pub kind: RawErrorKind,
}

impl RawStoreError {
    fn code_in(&self, codes: &[&str]) -> bool {
        self.code.as_deref().is_some_and(|c| codes.contains(&c))
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code_in(UNIQUE_VIOLATION)
            || self.message.contains("UNIQUE constraint failed")
            || self.message.contains("duplicate key value")
            || self.write_errors.iter().any(RawStoreError::is_unique_violation)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.code_in(FOREIGN_KEY_VIOLATION) || self.message.contains("FOREIGN KEY constraint failed")
    }
}

impl From<&sqlx::Error> for RawStoreError {
    fn from(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let key_value = db_err
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.detail())
                    .and_then(parse_key_detail);
                RawStoreError {
                    code: db_err.code().map(|c| c.into_owned()),
                    message: db_err.message().to_string(),
                    key_value,
                    ..Default::default()
                }
            }
            sqlx::Error::ColumnDecode { index, source } => RawStoreError {
                message: source.to_string(),
                kind: RawErrorKind::Cast { path: Some(index.clone()), value: None },
                ..Default::default()
            },
            sqlx::Error::Decode(source) => RawStoreError {
                message: source.to_string(),
                kind: RawErrorKind::Cast { path: None, value: None },
                ..Default::default()
            },
            other => RawStoreError {
                message: other.to_string(),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyInfo {
    pub fields: Vec<String>,
    pub key_value: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone)]
pub struct MappedError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

/// Parses the Postgres `Key (a, b)=(x, y) already exists.` detail line.
fn parse_key_detail(detail: &str) -> Option<BTreeMap<String, String>> {
    let caps = KEY_DETAIL_RE.captures(detail)?;
    let names: Vec<String> = caps[1].split(',').map(|s| s.trim().to_string()).collect();
    let raw_values = caps[2].to_string();
    let values: Vec<&str> = raw_values.split(", ").collect();

    let map: BTreeMap<String, String> = if values.len() == names.len() {
        names.into_iter().zip(values.into_iter().map(str::to_string)).collect()
    } else {
        // a value contained ", "; keep the whole tuple for every column
        names.into_iter().map(|n| (n, raw_values.clone())).collect()
    };
    Some(map)
}

fn fields_from_message(message: &str) -> Vec<String> {
    if let Some(caps) = SQLITE_UNIQUE_RE.captures(message) {
        return caps[1]
            .split(',')
            .map(|col| col.trim())
            .map(|col| col.rsplit('.').next().unwrap_or(col).to_string())
            .filter(|col| !col.is_empty())
            .collect();
    }

    if let Some(caps) = KEY_DETAIL_RE.captures(message) {
        return caps[1]
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(caps) = DUP_KEY_RE.captures(message) {
        return caps[1]
            .split(',')
            .filter_map(|part| part.split(':').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
    }

    Vec::new()
}

pub fn extract_duplicate_fields(raw: &RawStoreError) -> DuplicateKeyInfo {
    if let Some(key_value) = &raw.key_value {
        return DuplicateKeyInfo {
            fields: key_value.keys().cloned().collect(),
            key_value: Some(key_value.clone()),
        };
    }

    if !raw.write_errors.is_empty() {
        let mut fields: Vec<String> = Vec::new();
        let mut aggregate = BTreeMap::new();
        for item in &raw.write_errors {
            let Some(kv) = &item.key_value else { continue };
            for (k, v) in kv {
                if !fields.contains(k) {
                    fields.push(k.clone());
                }
                aggregate.insert(k.clone(), v.clone());
            }
        }
        if !fields.is_empty() {
            return DuplicateKeyInfo { fields, key_value: Some(aggregate) };
        }
    }

    let fields = fields_from_message(&raw.message);
    if !fields.is_empty() {
        return DuplicateKeyInfo { fields, key_value: None };
    }

    DuplicateKeyInfo {
        fields: vec![PLACEHOLDER_FIELD.to_string()],
        key_value: None,
    }
}

fn validation(errors: Vec<String>) -> MappedError {
    let mut body = ErrorBody::new(ErrorCode::ValidationError, "Validation failed");
    body.errors = Some(errors);
    MappedError { status: StatusCode::BAD_REQUEST, body }
}

fn cast(message: &str, path: Option<String>, value: Option<String>) -> MappedError {
    let message = if message.is_empty() { "Invalid value provided" } else { message };
    let body = ErrorBody::new(ErrorCode::CastError, message)
        .with_details(json!({ "path": path, "value": value }));
    MappedError { status: StatusCode::BAD_REQUEST, body }
}

/// Returns `None` for failures outside the taxonomy; callers answer those with a 500.
pub fn map_store_error(raw: &RawStoreError) -> Option<MappedError> {
    if raw.is_unique_violation() {
        let info = extract_duplicate_fields(raw);
        let mut body = ErrorBody::new(
            ErrorCode::DuplicateKey,
            format!("Duplicate value for unique field(s): {}", info.fields.join(", ")),
        );
        body.fields = Some(info.fields);
        body.key_value = info.key_value;
        return Some(MappedError { status: StatusCode::CONFLICT, body });
    }

    match &raw.kind {
        RawErrorKind::Validation(errors) => return Some(validation(errors.clone())),
        RawErrorKind::Cast { path, value } => {
            return Some(cast(&raw.message, path.clone(), value.clone()));
        }
        RawErrorKind::Database => {}
    }

    if raw.code_in(CONSTRAINT_VALIDATION) {
        return Some(validation(vec![raw.message.clone()]));
    }
    if raw.code_in(INVALID_VALUE) {
        return Some(cast(&raw.message, None, None));
    }

    None
}

pub fn map_sqlx_error(err: &sqlx::Error) -> Option<MappedError> {
    map_store_error(&RawStoreError::from(err))
}
