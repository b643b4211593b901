use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::UploadedFile;
use crate::features::gallery::dtos::{
    DeletedImageDto, GalleryMetadataDto, GalleryRecordDto, GeneratedImageDto, GenerationOptions,
    UpdatedFieldsDto,
};
use crate::features::gallery::models::{GalleryRecord, GalleryRecordPatch, NewGalleryRecord};
use crate::features::gallery::store::GalleryStore;
use crate::modules::image_generation::ImageGenerator;
use crate::modules::storage::{BlobStore, Rehoster};
use crate::shared::constants::INITIAL_IMAGES_PATH;

/// Orchestrates the gallery workflows over the record store, the blob
/// store and the image providers
pub struct GalleryService {
    store: Arc<dyn GalleryStore>,
    blob_store: Arc<dyn BlobStore>,
    generator: Arc<ImageGenerator>,
    rehoster: Arc<Rehoster>,
    placeholder_generated_url: String,
}

impl GalleryService {
    pub fn new(
        store: Arc<dyn GalleryStore>,
        blob_store: Arc<dyn BlobStore>,
        generator: Arc<ImageGenerator>,
        rehoster: Arc<Rehoster>,
        placeholder_generated_url: String,
    ) -> Self {
        Self {
            store,
            blob_store,
            generator,
            rehoster,
            placeholder_generated_url,
        }
    }

    /// Upload a new image and create its record with the placeholder as
    /// generated image
    pub async fn create(
        &self,
        metadata: GalleryMetadataDto,
        image: UploadedFile,
    ) -> Result<GalleryRecordDto> {
        let initial_image_url = self.upload_initial_image(image).await?;

        let record = self
            .insert(
                metadata,
                initial_image_url,
                self.placeholder_generated_url.clone(),
            )
            .await?;

        Ok(record.into())
    }

    /// Generate a new derivative for an existing record and store it as the
    /// record's current generated image
    pub async fn generate_for_existing(
        &self,
        id: &str,
        options: GenerationOptions,
    ) -> Result<GeneratedImageDto> {
        let record = self.find(id).await?;

        if record.initial_image_url.trim().is_empty() {
            return Err(AppError::InvalidState(format!(
                "La imagen con ID '{}' no tiene imagen inicial.",
                id
            )));
        }

        let generated_url = self
            .generator
            .generate(
                options.provider,
                &options.prompt,
                &record.initial_image_url,
                options.style.as_deref(),
            )
            .await?;

        let patch = GalleryRecordPatch::generated_image(generated_url.clone(), Utc::now());
        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(
            "Generated image stored: id={}, provider={}",
            id, options.provider
        );

        Ok(GeneratedImageDto {
            id: record.id,
            prompt: options.prompt,
            initial_image_url: record.initial_image_url,
            generated_image_url: generated_url,
            model_used: options.provider.display_name().to_string(),
        })
    }

    /// Upload, generate, rehost, then insert once. Any failure before the
    /// insert leaves the record store untouched.
    pub async fn create_and_generate(
        &self,
        metadata: GalleryMetadataDto,
        image: UploadedFile,
        options: GenerationOptions,
    ) -> Result<GalleryRecordDto> {
        let initial_image_url = self.upload_initial_image(image).await?;

        let provider_url = self
            .generator
            .generate(
                options.provider,
                &options.prompt,
                &initial_image_url,
                options.style.as_deref(),
            )
            .await?;

        let generated_image_url = self.rehoster.rehost(&provider_url).await?;

        let record = self
            .insert(metadata, initial_image_url, generated_image_url)
            .await?;

        info!(
            "Gallery record created with generated image: id={}, provider={}",
            record.id, options.provider
        );

        Ok(record.into())
    }

    pub async fn get(&self, id: &str) -> Result<GalleryRecordDto> {
        Ok(self.find(id).await?.into())
    }

    pub async fn list(&self) -> Result<Vec<GalleryRecordDto>> {
        let records = self.store.list().await?;
        debug!("Listed {} gallery records", records.len());
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn update_metadata(
        &self,
        id: &str,
        metadata: GalleryMetadataDto,
    ) -> Result<UpdatedFieldsDto> {
        let patch = GalleryRecordPatch::metadata(metadata.name, metadata.description, Utc::now());

        let record = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!("Gallery record updated: id={}", id);

        Ok(UpdatedFieldsDto {
            name: record.name,
            description: record.description,
            updated_at: record.updated_at.unwrap_or_else(Utc::now),
        })
    }

    pub async fn delete(&self, id: &str) -> Result<DeletedImageDto> {
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }

        info!("Gallery record deleted: id={}", id);
        Ok(DeletedImageDto { id: id.to_string() })
    }

    async fn find(&self, id: &str) -> Result<GalleryRecord> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    async fn insert(
        &self,
        metadata: GalleryMetadataDto,
        initial_image_url: String,
        generated_image_url: String,
    ) -> Result<GalleryRecord> {
        let record = self
            .store
            .add(NewGalleryRecord {
                name: metadata.name,
                description: metadata.description,
                initial_image_url,
                generated_image_url,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            "Gallery record created: id={}, initial_image_url={}",
            record.id, record.initial_image_url
        );
        Ok(record)
    }

    async fn upload_initial_image(&self, image: UploadedFile) -> Result<String> {
        let path = format!(
            "{}/{}_{}",
            INITIAL_IMAGES_PATH,
            Uuid::new_v4(),
            sanitize_file_name(&image.file_name)
        );

        self.blob_store
            .upload_public(&path, image.data, &image.content_type)
            .await
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("La imagen con ID '{}' no existe.", id))
}

/// Keep file names URL-safe: ASCII alphanumerics, '.', '-' and '_'
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['.', '_']).is_empty() {
        "imagen".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_generation::ImageProvider;
    use crate::shared::test_helpers::{
        png_upload, GalleryFixture, ScriptedBackend, PLACEHOLDER_URL,
    };
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn metadata(name: &str, description: &str) -> GalleryMetadataDto {
        GalleryMetadataDto {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    fn options(provider: ImageProvider) -> GenerationOptions {
        GenerationOptions {
            prompt: "Make this a 90s cartoon".to_string(),
            provider,
            style: None,
        }
    }

    async fn serve_generated_image() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0xff, 0xd8], "image/jpeg"))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("vase.png"), "vase.png");
        assert_eq!(sanitize_file_name("mi jarrón.png"), "mi_jarr_n.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(""), "imagen");
        assert_eq!(sanitize_file_name("..."), "imagen");
    }

    #[tokio::test]
    async fn test_create_uploads_and_uses_placeholder() {
        let fixture = GalleryFixture::new();

        let record = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.name, "Vase");
        assert_eq!(record.description, "ceramic");
        assert!(!record.initial_image_url.is_empty());
        assert!(record.initial_image_url.ends_with("_vase.png"));
        assert_eq!(record.generated_image_url, PLACEHOLDER_URL);
        assert!(record.updated_at.is_none());

        let stored = fixture.blobs.get_by_url(&record.initial_image_url).unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(fixture.store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_storage_failure_creates_no_record() {
        let fixture = GalleryFixture::with_failing_blobs();

        let err = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(fixture.store.len(), 0);
    }

    #[tokio::test]
    async fn test_generate_for_existing_overwrites_generated_url() {
        let fixture = GalleryFixture::new();
        let created = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap();

        let result = fixture
            .service
            .generate_for_existing(&created.id, options(ImageProvider::Replicate))
            .await
            .unwrap();

        assert_eq!(result.id, created.id);
        assert_eq!(result.generated_image_url, GalleryFixture::REPLICATE_URL);
        assert_eq!(result.initial_image_url, created.initial_image_url);
        assert_eq!(result.model_used, "Replicate (Flux Kontext Pro)");
        assert_eq!(fixture.replicate.calls(), 1);
        assert_eq!(
            fixture.replicate.last_call().map(|c| c.1),
            Some(created.initial_image_url.clone())
        );

        let stored = fixture.service.get(&created.id).await.unwrap();
        assert_eq!(stored.generated_image_url, GalleryFixture::REPLICATE_URL);
        assert_eq!(stored.initial_image_url, created.initial_image_url);
        assert_eq!(stored.created_at, created.created_at);
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_generate_for_missing_record_skips_provider() {
        let fixture = GalleryFixture::new();

        let err = fixture
            .service
            .generate_for_existing("missing", options(ImageProvider::OpenAi))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fixture.openai.calls(), 0);
        assert_eq!(fixture.replicate.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_without_initial_image_is_invalid_state() {
        let fixture = GalleryFixture::new();
        let record = fixture.store.insert_raw("Vacía", "sin imagen", "");

        let err = fixture
            .service
            .generate_for_existing(&record.id, options(ImageProvider::Replicate))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(fixture.replicate.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_provider_failure_leaves_record_unchanged() {
        let fixture = GalleryFixture::with_openai(ScriptedBackend::failing("content policy"));
        let created = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap();

        let err = fixture
            .service
            .generate_for_existing(&created.id, options(ImageProvider::OpenAi))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Provider(_)));
        let stored = fixture.service.get(&created.id).await.unwrap();
        assert_eq!(stored.generated_image_url, PLACEHOLDER_URL);
        assert!(stored.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_create_and_generate_inserts_once_with_rehosted_url() {
        let server = serve_generated_image().await;
        let vendor_url = format!("{}/vendor/out.jpg", server.uri());
        let fixture = GalleryFixture::with_openai(ScriptedBackend::succeeding(&vendor_url));

        let record = fixture
            .service
            .create_and_generate(
                metadata("Vase", "ceramic"),
                png_upload("vase.png"),
                options(ImageProvider::OpenAi),
            )
            .await
            .unwrap();

        assert_eq!(fixture.store.len(), 1);
        assert!(!record.initial_image_url.is_empty());
        assert_ne!(record.generated_image_url, vendor_url);
        assert_ne!(record.generated_image_url, PLACEHOLDER_URL);

        let rehosted = fixture.blobs.get_by_url(&record.generated_image_url).unwrap();
        assert_eq!(rehosted.data, vec![0xff, 0xd8]);
        assert_eq!(rehosted.content_type, "image/jpeg");
        assert_eq!(
            fixture.openai.last_call().map(|c| c.1),
            Some(record.initial_image_url.clone())
        );
    }

    #[tokio::test]
    async fn test_create_and_generate_provider_failure_creates_nothing() {
        let fixture = GalleryFixture::with_replicate(ScriptedBackend::failing("quota"));

        let err = fixture
            .service
            .create_and_generate(
                metadata("Vase", "ceramic"),
                png_upload("vase.png"),
                options(ImageProvider::Replicate),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(fixture.store.len(), 0);
    }

    #[tokio::test]
    async fn test_create_and_generate_rehost_failure_creates_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        let vendor_url = format!("{}/expired.jpg", server.uri());
        let fixture = GalleryFixture::with_replicate(ScriptedBackend::succeeding(&vendor_url));

        let err = fixture
            .service
            .create_and_generate(
                metadata("Vase", "ceramic"),
                png_upload("vase.png"),
                options(ImageProvider::Replicate),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
        assert_eq!(fixture.store.len(), 0);
    }

    #[tokio::test]
    async fn test_update_metadata_sets_updated_at_only_on_metadata() {
        let fixture = GalleryFixture::new();
        let created = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap();

        let updated = fixture
            .service
            .update_metadata(&created.id, metadata("Jarrón", "cerámica azul"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Jarrón");
        assert_eq!(updated.description, "cerámica azul");

        let stored = fixture.service.get(&created.id).await.unwrap();
        assert_eq!(stored.name, "Jarrón");
        assert_eq!(stored.initial_image_url, created.initial_image_url);
        assert_eq!(stored.generated_image_url, created.generated_image_url);
        assert_eq!(stored.created_at, created.created_at);
        assert_eq!(stored.updated_at, Some(updated.updated_at));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let fixture = GalleryFixture::new();
        let err = fixture
            .service
            .update_metadata("missing", metadata("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let fixture = GalleryFixture::new();
        let created = fixture
            .service
            .create(metadata("Vase", "ceramic"), png_upload("vase.png"))
            .await
            .unwrap();

        let deleted = fixture.service.delete(&created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);

        let err = fixture.service.get(&created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = fixture.service.delete(&created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_returns_every_record() {
        let fixture = GalleryFixture::new();
        for name in ["uno", "dos", "tres"] {
            fixture
                .service
                .create(metadata(name, "desc"), png_upload("a.png"))
                .await
                .unwrap();
        }

        let records = fixture.service.list().await.unwrap();
        assert_eq!(records.len(), 3);
    }
}
