use crate::domain::models::{
    asset::{ImageUpload, UploadedAsset},
    booking::Booking,
    event::{Event, EventSort},
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self, sort: EventSort) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    /// Exact match on the (title, date, time, venue) identity tuple.
    async fn find_duplicate(&self, title: &str, date: &str, time: &str, venue: &str) -> Result<Option<Event>, AppError>;
    /// Slugs equal to `base` or starting with `base-`, case-insensitively.
    async fn find_slugs_like(&self, base: &str, exclude_id: Option<&str>) -> Result<Vec<String>, AppError>;
    async fn list_sharing_tags(&self, tags: &[String], exclude_id: &str) -> Result<Vec<Event>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_event_and_email(&self, event_id: &str, email: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, folder: &str, image: &ImageUpload) -> Result<UploadedAsset, AppError>;
    async fn delete(&self, asset_id: &str) -> Result<(), AppError>;
}
