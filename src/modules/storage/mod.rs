//! Blob storage for gallery images
//!
//! [`BlobStore`] is the seam the gallery service writes through;
//! [`S3BlobStore`] is the production implementation and [`Rehoster`] copies
//! remote images into it.

mod rehost;
mod s3_blob_store;

use async_trait::async_trait;

use crate::core::error::Result;

pub use rehost::Rehoster;
pub use s3_blob_store::S3BlobStore;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `path` with anonymous read access and return its
    /// public URL.
    async fn upload_public(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
}
