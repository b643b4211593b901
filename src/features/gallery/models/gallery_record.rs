use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::gallery::dtos::GalleryRecordDto;

/// Database model for a gallery record
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GalleryRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub initial_image_url: String,
    pub generated_image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields of a record before the store assigns its id
#[derive(Debug, Clone)]
pub struct NewGalleryRecord {
    pub name: String,
    pub description: String,
    pub initial_image_url: String,
    pub generated_image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone)]
pub struct GalleryRecordPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub generated_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl GalleryRecordPatch {
    pub fn metadata(name: String, description: String, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: Some(name),
            description: Some(description),
            generated_image_url: None,
            updated_at,
        }
    }

    pub fn generated_image(url: String, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            description: None,
            generated_image_url: Some(url),
            updated_at,
        }
    }

    /// Apply to an in-memory copy, mirroring what the store does
    pub fn apply_to(&self, record: &mut GalleryRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(url) = &self.generated_image_url {
            record.generated_image_url = url.clone();
        }
        record.updated_at = Some(self.updated_at);
    }
}

impl From<GalleryRecord> for GalleryRecordDto {
    fn from(r: GalleryRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            initial_image_url: r.initial_image_url,
            generated_image_url: r.generated_image_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
