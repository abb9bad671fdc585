#![allow(dead_code)]

use events_backend::{
    api::router::create_router,
    config::{BlobStoreConfig, Config, DatabaseConfig},
    domain::{
        models::{
            asset::{ImageUpload, UploadedAsset},
            booking::Booking,
            event::{Event, EventSort},
        },
        ports::{BlobStore, BookingRepository, EventRepository},
    },
    error::AppError,
    infra::{
        database::Database,
        repositories::{sqlite_booking_repo::SqliteBookingRepo, sqlite_event_repo::SqliteEventRepo},
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "----events-test-boundary";
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

/// Records every upload and delete; either side can be told to fail.
#[derive(Default)]
pub struct MockBlobStore {
    counter: AtomicUsize,
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_upload: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockBlobStore {
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(&self, folder: &str, image: &ImageUpload) -> Result<UploadedAsset, AppError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(AppError::Upload("mock upload refused".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let asset_id = format!("{}/asset-{}", folder, n);
        self.uploads.lock().unwrap().push(asset_id.clone());
        Ok(UploadedAsset {
            url: format!("https://cdn.test/{}/{}", asset_id, image.file_name),
            asset_id,
        })
    }

    async fn delete(&self, asset_id: &str) -> Result<(), AppError> {
        self.deletes.lock().unwrap().push(asset_id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Upload("mock delete refused".into()));
        }
        Ok(())
    }
}

/// Event repository whose pre-write reads can be switched off, so a request
/// behaves as if a concurrent writer committed between its checks and its insert.
/// `stale_event`, when set, is returned for every id lookup, as if the row was
/// deleted after it was read.
pub struct RacingEventRepo {
    inner: SqliteEventRepo,
    pub blind: AtomicBool,
    pub stale_event: Mutex<Option<Event>>,
}

#[async_trait]
impl EventRepository for RacingEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        self.inner.create(event).await
    }
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError> {
        self.inner.find_by_slug(slug).await
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        let stale = self.stale_event.lock().unwrap().clone();
        if stale.is_some() {
            return Ok(stale);
        }
        self.inner.find_by_id(id).await
    }
    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        self.inner.list(sort).await
    }
    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        self.inner.update(event).await
    }
    async fn find_duplicate(&self, title: &str, date: &str, time: &str, venue: &str) -> Result<Option<Event>, AppError> {
        if self.blind.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_duplicate(title, date, time, venue).await
    }
    async fn find_slugs_like(&self, base: &str, exclude_id: Option<&str>) -> Result<Vec<String>, AppError> {
        if self.blind.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        self.inner.find_slugs_like(base, exclude_id).await
    }
    async fn list_sharing_tags(&self, tags: &[String], exclude_id: &str) -> Result<Vec<Event>, AppError> {
        self.inner.list_sharing_tags(tags, exclude_id).await
    }
}

/// Booking repository whose pair lookup can be switched off, so the store's
/// unique constraint is the only thing left to reject a repeat booking.
pub struct RacingBookingRepo {
    inner: SqliteBookingRepo,
    pub blind: AtomicBool,
}

#[async_trait]
impl BookingRepository for RacingBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.inner.create(booking).await
    }
    async fn find_by_event_and_email(&self, event_id: &str, email: &str) -> Result<Option<Booking>, AppError> {
        if self.blind.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_event_and_email(event_id, email).await
    }
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Booking>, AppError> {
        self.inner.list_by_event(event_id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub blob_store: Arc<MockBlobStore>,
    pub event_repo: Arc<RacingEventRepo>,
    pub booking_repo: Arc<RacingBookingRepo>,
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        port: 0,
        database: DatabaseConfig {
            url: db_url.to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(45),
        },
        blob_store: BlobStoreConfig {
            base_url: "http://localhost".to_string(),
            cloud_name: "test-cloud".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "DevEvent".to_string(),
            timeout: Duration::from_secs(5),
        },
        max_upload_bytes: 1024 * 1024,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = test_config(&db_url);
        let blob_store = Arc::new(MockBlobStore::default());
        let event_repo = Arc::new(RacingEventRepo {
            inner: SqliteEventRepo::new(pool.clone()),
            blind: AtomicBool::new(false),
            stale_event: Mutex::new(None),
        });
        let booking_repo = Arc::new(RacingBookingRepo {
            inner: SqliteBookingRepo::new(pool.clone()),
            blind: AtomicBool::new(false),
        });

        let state = Arc::new(AppState::new(
            config,
            Database::Sqlite(pool.clone()),
            event_repo.clone(),
            booking_repo.clone(),
            blob_store.clone(),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            blob_store,
            event_repo,
            booking_repo,
        }
    }

    pub fn set_blind(&self, blind: bool) {
        self.event_repo.blind.store(blind, Ordering::SeqCst);
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
        ).await.unwrap()
    }

    pub async fn send_json(&self, method: &str, uri: &str, payload: &Value) -> Response {
        self.router.clone().oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap()
    }

    /// POSTs a multipart event form. `image` is (file name, content type, bytes).
    pub async fn post_event(&self, fields: &[(String, String)], image: Option<(&str, &str, &[u8])>) -> Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/events")
                .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
                .body(Body::from(multipart_body(fields, image)))
                .unwrap()
        ).await.unwrap()
    }

    /// Creates an event with a valid image and returns the response body.
    pub async fn create_event(&self, fields: &[(String, String)]) -> Value {
        let res = self.post_event(fields, Some(("cover.png", "image/png", PNG_BYTES))).await;
        assert_eq!(res.status(), 201, "event creation failed");
        parse_body(res).await
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A complete, valid event form; tweak individual entries per test.
pub fn event_fields(title: &str) -> Vec<(String, String)> {
    [
        ("title", title),
        ("description", "An evening of talks"),
        ("overview", "Lightning talks followed by networking"),
        ("venue", "Main Hall"),
        ("location", "Berlin, Germany"),
        ("date", "2026-05-15"),
        ("time", "09:30"),
        ("mode", "offline"),
        ("audience", "Developers"),
        ("organizer", "Rust Berlin"),
        ("agenda", "Welcome"),
        ("agenda", "Talks"),
        ("tags", "rust"),
        ("tags", "meetup"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Replaces every entry named `name` with a single `value`.
pub fn with_field(mut fields: Vec<(String, String)>, name: &str, value: &str) -> Vec<(String, String)> {
    fields.retain(|(k, _)| k != name);
    fields.push((name.to_string(), value.to_string()));
    fields
}

pub fn multipart_body(fields: &[(String, String)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
