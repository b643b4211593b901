use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};
use uuid::Uuid;

use super::BlobStore;
use crate::core::error::{AppError, Result};
use crate::shared::constants::{
    extension_for_content_type, DEFAULT_IMAGE_CONTENT_TYPE, GENERATED_IMAGES_PATH,
};

/// Copies a remote image into the blob store.
///
/// Provider-hosted URLs expire; the gallery keeps the copy's URL instead.
pub struct Rehoster {
    client: reqwest::Client,
    blob_store: Arc<dyn BlobStore>,
}

impl Rehoster {
    pub fn new(blob_store: Arc<dyn BlobStore>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, blob_store })
    }

    /// Download `remote_url` and upload it under a fresh random name,
    /// returning the public URL of the copy.
    pub async fn rehost(&self, remote_url: &str) -> Result<String> {
        debug!("Rehosting {}", remote_url);

        let response = self.client.get(remote_url).send().await.map_err(|e| {
            tracing::error!("Rehost download failed: {:?}", e);
            AppError::Fetch(format!("No se pudo descargar '{}': {}", remote_url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!(
                "HTTP {} al descargar '{}': {}",
                status, remote_url, body
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read downloaded image: {}", e)))?;

        let extension = extension_for_content_type(&content_type).unwrap_or("png");
        let path = format!("{}/{}.{}", GENERATED_IMAGES_PATH, Uuid::new_v4(), extension);

        let url = self
            .blob_store
            .upload_public(&path, data.to_vec(), &content_type)
            .await?;

        info!(
            "Rehosted image: source={}, size={}, url={}",
            remote_url,
            data.len(),
            url
        );

        Ok(url)
    }
}
