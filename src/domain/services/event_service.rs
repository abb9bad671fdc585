use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::{
    asset::{ImageUpload, UploadedAsset},
    event::{CreateEventInput, Event, EventSort, UpdateEventInput},
};
use crate::domain::ports::{BlobStore, EventRepository};
use crate::domain::services::slug::{base_slug, generate_unique_slug, parse_slug};
use crate::domain::services::upload::UploadCoordinator;
use crate::error::{AppError, ExistingEvent};

pub struct EventService {
    repo: Arc<dyn EventRepository>,
    uploads: UploadCoordinator,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, blob_store: Arc<dyn BlobStore>, upload_folder: String) -> Self {
        Self {
            repo,
            uploads: UploadCoordinator::new(blob_store, upload_folder),
        }
    }

    pub async fn find_by_slug(&self, raw_slug: &str) -> Result<Event, AppError> {
        let slug = parse_slug(raw_slug)?;
        self.repo
            .find_by_slug(&slug)
            .await?
            .ok_or(AppError::EventNotFound(slug))
    }

    pub async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError> {
        self.repo.list(sort).await
    }

    pub async fn preflight_duplicate(
        &self,
        title: &str,
        date: &str,
        time: &str,
        venue: &str,
    ) -> Result<Option<ExistingEvent>, AppError> {
        let existing = self.repo.find_duplicate(title, date, time, venue).await?;
        Ok(existing.map(|e| ExistingEvent { id: e.id, slug: e.slug }))
    }

    /// Validates, runs the duplicate preflight, uploads the image and writes the
    /// record. Field errors win over a missing image. Once the image is stored,
    /// any failure deletes it again before the error is returned.
    pub async fn create_event(&self, input: CreateEventInput, image: Option<ImageUpload>) -> Result<Event, AppError> {
        let input = input.prepare()?;
        if base_slug(&input.title).is_empty() {
            return Err(AppError::validation_field(
                "Title must contain at least one letter or number",
                "title",
            ));
        }
        let image = image.ok_or(AppError::MissingImage)?;
        self.uploads.check(&image)?;

        if let Some(existing) = self
            .preflight_duplicate(&input.title, &input.date, &input.time, &input.venue)
            .await?
        {
            info!(existing_slug = %existing.slug, "rejecting duplicate event before upload");
            return Err(AppError::DuplicateEvent { id: existing.id, slug: existing.slug });
        }

        let asset = self.uploads.upload(&image).await?;

        match self.persist(input, &asset).await {
            Ok(event) => {
                info!(event_id = %event.id, slug = %event.slug, "event created");
                Ok(event)
            }
            Err(e) => {
                warn!(asset_id = %asset.asset_id, error = %e, "event write failed, rolling back image");
                self.uploads.rollback(&asset).await;
                Err(e)
            }
        }
    }

    async fn persist(&self, input: CreateEventInput, asset: &UploadedAsset) -> Result<Event, AppError> {
        let slug = generate_unique_slug(self.repo.as_ref(), &input.title, None).await?;
        let event = Event::new(input, slug, asset.url.clone());
        self.repo.create(&event).await
    }

    /// Applies a partial update. The slug is regenerated only when the title changes.
    pub async fn update_event(&self, raw_slug: &str, patch: UpdateEventInput) -> Result<Event, AppError> {
        let mut event = self.find_by_slug(raw_slug).await?;
        let merged = patch.merge(&event).prepare()?;

        if merged.title != event.title {
            event.slug = generate_unique_slug(self.repo.as_ref(), &merged.title, Some(&event.id)).await?;
        }
        event.apply(merged);

        let updated = self.repo.update(&event).await?;
        info!(event_id = %updated.id, slug = %updated.slug, "event updated");
        Ok(updated)
    }

    /// Events sharing at least one tag with the one at `raw_slug`. Never fails:
    /// a missing source or a store error yields an empty list.
    pub async fn similar_to(&self, raw_slug: &str) -> Vec<Event> {
        let source = match self.find_by_slug(raw_slug).await {
            Ok(event) => event,
            Err(e) => {
                warn!(slug = %raw_slug, error = %e, "similar events: source lookup failed");
                return Vec::new();
            }
        };

        self.repo
            .list_sharing_tags(&source.tags.0, &source.id)
            .await
            .unwrap_or_else(|e| {
                warn!(slug = %source.slug, error = %e, "similar events: tag lookup failed");
                Vec::new()
            })
    }
}
