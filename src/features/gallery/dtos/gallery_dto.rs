use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::image_generation::ImageProvider;

/// Gallery record as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRecordDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub initial_image_url: String,
    pub generated_image_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable metadata of a record
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GalleryMetadataDto {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 5000,
        message = "description must be 1-5000 characters"
    ))]
    pub description: String,
}

/// Generation options shared by both generation endpoints
#[derive(Debug, Clone, Validate)]
pub struct GenerationOptions {
    #[validate(length(min = 1, max = 4000, message = "prompt must be 1-4000 characters"))]
    pub prompt: String,
    pub provider: ImageProvider,
    /// Style hint; only the OpenAI provider uses it ("vivid" or "natural")
    pub style: Option<String>,
}

/// Response of `PUT /imagenes/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedFieldsDto {
    pub name: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Response of `DELETE /imagenes/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedImageDto {
    pub id: String,
}

/// Response of `POST /imagenes/generar_imagen_ia`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageDto {
    pub id: String,
    pub prompt: String,
    pub initial_image_url: String,
    pub generated_image_url: String,
    pub model_used: String,
}

/// Upload form for `POST /imagenes/`
/// Note: documentation only, the handler reads the form through `FormFields`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateImageForm {
    /// Alias: `nombre_pieza`
    #[schema(example = "Vase")]
    pub name: String,
    /// Alias: `descripcion`
    #[schema(example = "ceramic")]
    pub description: String,
    /// Alias: `imagen`
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// Metadata form for `PUT /imagenes/{id}`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateImageForm {
    pub name: String,
    pub description: String,
}

/// Form for `POST /imagenes/generar_imagen_ia`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct GenerateImageForm {
    pub prompt: String,
    /// Alias: `id`
    pub image_id: String,
    /// "replicate" or "openai" (alias: `provider`)
    #[schema(example = "replicate")]
    pub model: String,
    /// Alias: `style_hint`, `style_description_model`
    #[schema(example = "vivid")]
    pub style: Option<String>,
}

/// Form for `POST /imagenes/subir_y_generar_ia`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAndGenerateForm {
    pub name: String,
    pub description: String,
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
    pub prompt: String,
    #[schema(example = "openai")]
    pub model: String,
    pub style: Option<String>,
}
