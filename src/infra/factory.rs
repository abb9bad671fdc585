use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domain::ports::{BookingRepository, EventRepository};
use crate::error::StartupError;
use crate::infra::blob::cloudinary_blob_store::CloudinaryBlobStore;
use crate::infra::database::Database;
use crate::state::AppState;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_event_repo::PostgresEventRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_event_repo::SqliteEventRepo,
};

pub fn bootstrap_state(config: &Config, db: &Database) -> Result<AppState, StartupError> {
    let blob_store = Arc::new(CloudinaryBlobStore::new(&config.blob_store)?);

    let (event_repo, booking_repo): (Arc<dyn EventRepository>, Arc<dyn BookingRepository>) = match db {
        Database::Postgres(pool) => (
            Arc::new(PostgresEventRepo::new(pool.clone())),
            Arc::new(PostgresBookingRepo::new(pool.clone())),
        ),
        Database::Sqlite(pool) => (
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
        ),
    };

    info!(backend = db.backend(), cloud = %config.blob_store.cloud_name, "application state ready");

    Ok(AppState::new(
        config.clone(),
        db.clone(),
        event_repo,
        booking_repo,
        blob_store,
    ))
}
