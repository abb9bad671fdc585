use std::sync::Arc;
use crate::domain::ports::{BlobStore, BookingRepository, EventRepository};
use crate::domain::services::{booking_service::BookingService, event_service::EventService};
use crate::config::Config;
use crate::infra::database::Database;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub event_service: Arc<EventService>,
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    /// Wires the services on top of the given adapters.
    pub fn new(
        config: Config,
        db: Database,
        event_repo: Arc<dyn EventRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        let event_service = Arc::new(EventService::new(
            event_repo.clone(),
            blob_store,
            config.blob_store.folder.clone(),
        ));
        let booking_service = Arc::new(BookingService::new(event_repo, booking_repo));

        Self {
            config,
            db,
            event_service,
            booking_service,
        }
    }
}
