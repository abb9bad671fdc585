use crate::config::BlobStoreConfig;
use crate::domain::models::asset::{ImageUpload, UploadedAsset};
use crate::domain::ports::BlobStore;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::error;

/// Image store speaking the Cloudinary upload API.
pub struct CloudinaryBlobStore {
    client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryBlobStore {
    pub fn new(config: &BlobStoreConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{}", self.base_url, self.cloud_name, action)
    }

    fn signature(&self, params: &[(&str, &str)]) -> String {
        sign_params(params, &self.api_secret)
    }
}

/// Signs `params` the way the upload API expects: sorted by name, joined as
/// `k=v&k=v`, suffixed with the secret and hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[async_trait]
impl BlobStore for CloudinaryBlobStore {
    async fn upload(&self, folder: &str, image: &ImageUpload) -> Result<UploadedAsset, AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.signature(&[("folder", folder), ("timestamp", timestamp.as_str())]);

        let mut file = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            file = file
                .mime_str(content_type)
                .map_err(|e| AppError::Upload(format!("Invalid content type: {}", e)))?;
        }

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);

        let res = self.client.post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Blob store connection error: {}", e);
                error!("{}", msg);
                AppError::Upload(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Blob store upload failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Upload(msg));
        }

        let body: UploadResponse = res
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Unreadable upload response: {}", e)))?;

        Ok(UploadedAsset { url: body.secure_url, asset_id: body.public_id })
    }

    async fn delete(&self, asset_id: &str) -> Result<(), AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.signature(&[("public_id", asset_id), ("timestamp", timestamp.as_str())]);

        let params = [
            ("public_id", asset_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
        ];

        let res = self.client.post(self.endpoint("destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Blob store connection error: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!("Blob store delete failed. Status: {}, Body: {}", status, text)));
        }

        let body: DestroyResponse = res
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Unreadable destroy response: {}", e)))?;

        // "not found" means there is nothing left to clean up
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AppError::Upload(format!("Blob store refused delete: {}", other))),
        }
    }
}
