//! Record store for the `galeria` collection

mod postgres_store;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::gallery::models::{GalleryRecord, GalleryRecordPatch, NewGalleryRecord};

pub use postgres_store::PostgresGalleryStore;

#[async_trait]
pub trait GalleryStore: Send + Sync {
    /// Insert a record; the store assigns its id
    async fn add(&self, record: NewGalleryRecord) -> Result<GalleryRecord>;

    async fn get(&self, id: &str) -> Result<Option<GalleryRecord>>;

    /// Returns `None` when no record has this id
    async fn update(&self, id: &str, patch: GalleryRecordPatch) -> Result<Option<GalleryRecord>>;

    /// Returns `false` when no record has this id
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Every record, in store order
    async fn list(&self) -> Result<Vec<GalleryRecord>>;
}
