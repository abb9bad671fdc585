use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::asset::{ImageUpload, UploadedAsset};
use crate::domain::ports::BlobStore;
use crate::error::AppError;

/// Pairs every image upload with a compensating delete.
pub struct UploadCoordinator {
    blob_store: Arc<dyn BlobStore>,
    folder: String,
}

impl UploadCoordinator {
    pub fn new(blob_store: Arc<dyn BlobStore>, folder: String) -> Self {
        Self { blob_store, folder }
    }

    /// Rejects images the blob store must never see. Runs before any side effect.
    pub fn check(&self, image: &ImageUpload) -> Result<(), AppError> {
        if image.bytes.is_empty() {
            return Err(AppError::MissingImage);
        }
        if let Some(content_type) = &image.content_type
            && !content_type.starts_with("image/")
        {
            return Err(AppError::validation_field(
                format!("Unsupported image type: {}", content_type),
                "image",
            ));
        }
        Ok(())
    }

    pub async fn upload(&self, image: &ImageUpload) -> Result<UploadedAsset, AppError> {
        let asset = self
            .blob_store
            .upload(&self.folder, image)
            .await
            .map_err(|e| match e {
                AppError::Upload(_) => e,
                other => AppError::Upload(other.to_string()),
            })?;

        info!(asset_id = %asset.asset_id, "image uploaded");
        Ok(asset)
    }

    /// Best-effort delete of an asset whose record was never written.
    /// Failures are logged and dropped so the original error reaches the caller.
    pub async fn rollback(&self, asset: &UploadedAsset) {
        match self.blob_store.delete(&asset.asset_id).await {
            Ok(()) => info!(asset_id = %asset.asset_id, "rolled back uploaded image"),
            Err(e) => warn!(asset_id = %asset.asset_id, error = %e, "image rollback failed"),
        }
    }
}
