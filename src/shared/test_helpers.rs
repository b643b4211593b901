//! In-memory doubles for the external collaborators of the gallery service

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::UploadedFile;
use crate::features::gallery::models::{GalleryRecord, GalleryRecordPatch, NewGalleryRecord};
use crate::features::gallery::store::GalleryStore;
use crate::features::gallery::GalleryService;
use crate::modules::image_generation::{GenerationBackend, ImageGenerator};
use crate::modules::storage::{BlobStore, Rehoster};

pub const PLACEHOLDER_URL: &str = "https://picsum.photos/601";

/// Smallest valid PNG header, enough for content sniffers
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn png_upload(file_name: &str) -> UploadedFile {
    UploadedFile {
        file_name: file_name.to_string(),
        content_type: "image/png".to_string(),
        data: PNG_BYTES.to_vec(),
    }
}

#[derive(Default)]
pub struct InMemoryGalleryStore {
    records: Mutex<Vec<GalleryRecord>>,
    failing: bool,
}

impl InMemoryGalleryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails as if the database were unreachable
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Insert a record directly, bypassing the service
    pub fn insert_raw(&self, name: &str, description: &str, initial_image_url: &str) -> GalleryRecord {
        let record = GalleryRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            initial_image_url: initial_image_url.to_string(),
            generated_image_url: PLACEHOLDER_URL.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl GalleryStore for InMemoryGalleryStore {
    async fn add(&self, record: NewGalleryRecord) -> Result<GalleryRecord> {
        self.check()?;
        let record = GalleryRecord {
            id: Uuid::new_v4().simple().to_string(),
            name: record.name,
            description: record.description,
            initial_image_url: record.initial_image_url,
            generated_image_url: record.generated_image_url,
            created_at: record.created_at,
            updated_at: None,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<GalleryRecord>> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update(&self, id: &str, patch: GalleryRecordPatch) -> Result<Option<GalleryRecord>> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        Ok(records.iter_mut().find(|r| r.id == id).map(|record| {
            patch.apply_to(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn list(&self) -> Result<Vec<GalleryRecord>> {
        self.check()?;
        Ok(self.records.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    failing: bool,
}

impl InMemoryBlobStore {
    pub const BASE_URL: &'static str = "https://blobs.test/vr-backend-galeria/public";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            failing: true,
        }
    }

    pub fn get_by_url(&self, url: &str) -> Option<StoredBlob> {
        self.blobs.lock().unwrap().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload_public(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        if self.failing {
            return Err(AppError::Storage("bucket unavailable".to_string()));
        }
        let url = format!("{}/{}", Self::BASE_URL, path);
        self.blobs.lock().unwrap().insert(
            url.clone(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(url)
    }
}

/// (prompt, source_url, style) of a generation call
pub type GenerationCall = (String, String, Option<String>);

/// Generation backend returning a fixed outcome and recording its calls
pub struct ScriptedBackend {
    outcome: std::result::Result<String, String>,
    calls: AtomicUsize,
    last_call: Mutex<Option<GenerationCall>>,
}

impl ScriptedBackend {
    pub fn succeeding(url: &str) -> Self {
        Self::with_outcome(Ok(url.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: std::result::Result<String, String>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<GenerationCall> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        prompt: &str,
        source_url: &str,
        style: Option<&str>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((
            prompt.to_string(),
            source_url.to_string(),
            style.map(str::to_string),
        ));
        self.outcome.clone().map_err(AppError::Provider)
    }
}

/// A gallery service wired to in-memory doubles
pub struct GalleryFixture {
    pub service: Arc<GalleryService>,
    pub store: Arc<InMemoryGalleryStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub replicate: Arc<ScriptedBackend>,
    pub openai: Arc<ScriptedBackend>,
}

impl GalleryFixture {
    pub const REPLICATE_URL: &'static str = "https://replicate.delivery/test/output.jpg";
    pub const OPENAI_URL: &'static str = "https://oaidalleapiprodscus.test/output.png";

    pub fn new() -> Self {
        Self::build(
            InMemoryGalleryStore::new(),
            InMemoryBlobStore::new(),
            ScriptedBackend::succeeding(Self::REPLICATE_URL),
            ScriptedBackend::succeeding(Self::OPENAI_URL),
        )
    }

    pub fn with_failing_blobs() -> Self {
        Self::build(
            InMemoryGalleryStore::new(),
            InMemoryBlobStore::failing(),
            ScriptedBackend::succeeding(Self::REPLICATE_URL),
            ScriptedBackend::succeeding(Self::OPENAI_URL),
        )
    }

    pub fn with_failing_store() -> Self {
        Self::build(
            InMemoryGalleryStore::failing(),
            InMemoryBlobStore::new(),
            ScriptedBackend::succeeding(Self::REPLICATE_URL),
            ScriptedBackend::succeeding(Self::OPENAI_URL),
        )
    }

    pub fn with_replicate(replicate: ScriptedBackend) -> Self {
        Self::build(
            InMemoryGalleryStore::new(),
            InMemoryBlobStore::new(),
            replicate,
            ScriptedBackend::succeeding(Self::OPENAI_URL),
        )
    }

    pub fn with_openai(openai: ScriptedBackend) -> Self {
        Self::build(
            InMemoryGalleryStore::new(),
            InMemoryBlobStore::new(),
            ScriptedBackend::succeeding(Self::REPLICATE_URL),
            openai,
        )
    }

    fn build(
        store: InMemoryGalleryStore,
        blobs: InMemoryBlobStore,
        replicate: ScriptedBackend,
        openai: ScriptedBackend,
    ) -> Self {
        let store = Arc::new(store);
        let blobs = Arc::new(blobs);
        let replicate = Arc::new(replicate);
        let openai = Arc::new(openai);

        let generator = Arc::new(ImageGenerator::new(replicate.clone(), openai.clone()));
        let rehoster = Arc::new(
            Rehoster::new(blobs.clone(), Duration::from_secs(30))
                .expect("rehost client should build"),
        );
        let service = Arc::new(GalleryService::new(
            store.clone(),
            blobs.clone(),
            generator,
            rehoster,
            PLACEHOLDER_URL.to_string(),
        ));

        Self {
            service,
            store,
            blobs,
            replicate,
            openai,
        }
    }
}
