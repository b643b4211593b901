use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::GalleryStore;
use crate::core::error::Result;
use crate::features::gallery::models::{GalleryRecord, GalleryRecordPatch, NewGalleryRecord};

const RECORD_COLUMNS: &str =
    "id, name, description, initial_image_url, generated_image_url, created_at, updated_at";

/// Gallery records in the `galeria` table
pub struct PostgresGalleryStore {
    pool: PgPool,
}

impl PostgresGalleryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GalleryStore for PostgresGalleryStore {
    async fn add(&self, record: NewGalleryRecord) -> Result<GalleryRecord> {
        let id = Uuid::now_v7().simple().to_string();

        let record = sqlx::query_as::<_, GalleryRecord>(&format!(
            r#"
            INSERT INTO galeria (id, name, description, initial_image_url, generated_image_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.initial_image_url)
        .bind(&record.generated_image_url)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert gallery record: {:?}", e);
            e
        })?;

        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<GalleryRecord>> {
        let record = sqlx::query_as::<_, GalleryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM galeria WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(&self, id: &str, patch: GalleryRecordPatch) -> Result<Option<GalleryRecord>> {
        let record = sqlx::query_as::<_, GalleryRecord>(&format!(
            r#"
            UPDATE galeria
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                generated_image_url = COALESCE($4, generated_image_url),
                updated_at = $5
            WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.generated_image_url)
        .bind(patch.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM galeria WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<GalleryRecord>> {
        let records =
            sqlx::query_as::<_, GalleryRecord>(&format!("SELECT {RECORD_COLUMNS} FROM galeria"))
                .fetch_all(&self.pool)
                .await?;

        Ok(records)
    }
}
