use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{FormFields, UploadedFile};
use crate::features::gallery::dtos::{
    CreateImageForm, DeletedImageDto, GalleryMetadataDto, GalleryRecordDto, GenerateImageForm,
    GeneratedImageDto, GenerationOptions, UpdateImageForm, UpdatedFieldsDto,
    UploadAndGenerateForm,
};
use crate::features::gallery::services::GalleryService;
use crate::modules::image_generation::ImageProvider;
use crate::shared::constants::{is_image_type_allowed, ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE};
use crate::shared::types::ApiResponse;

const NAME_FIELDS: &[&str] = &["name", "nombre_pieza"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "descripcion"];
const IMAGE_FIELDS: &[&str] = &["image", "imagen"];
const PROMPT_FIELDS: &[&str] = &["prompt"];
const IMAGE_ID_FIELDS: &[&str] = &["image_id", "id"];
const MODEL_FIELDS: &[&str] = &["model", "provider"];
const STYLE_FIELDS: &[&str] = &["style", "style_hint", "style_description_model"];

/// Upload a new image to the gallery
///
/// Accepts multipart/form-data with `name`, `description` and the `image`
/// file. The record starts with a placeholder generated image.
#[utoipa::path(
    post,
    path = "/imagenes/",
    tag = "imagenes",
    request_body(content = CreateImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record created", body = ApiResponse<GalleryRecordDto>),
        (status = 400, description = "Missing field or invalid image"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_image(
    State(service): State<Arc<GalleryService>>,
    mut form: FormFields,
) -> Result<Json<ApiResponse<GalleryRecordDto>>> {
    let metadata = read_metadata(&form)?;
    let image = read_image(&mut form)?;

    let record = service.create(metadata, image).await?;

    Ok(Json(ApiResponse::success(
        Some(record),
        Some("Registro creado correctamente".to_string()),
    )))
}

/// List every gallery record
#[utoipa::path(
    get,
    path = "/imagenes/",
    tag = "imagenes",
    responses(
        (status = 200, description = "All records with their count", body = ApiResponse<Vec<GalleryRecordDto>>),
        (status = 500, description = "Record store failure")
    )
)]
pub async fn list_images(
    State(service): State<Arc<GalleryService>>,
) -> Result<Json<ApiResponse<Vec<GalleryRecordDto>>>> {
    let records = service.list().await?;

    Ok(Json(ApiResponse::list(
        records,
        Some("Listado de imágenes obtenido correctamente.".to_string()),
    )))
}

/// Get one gallery record
#[utoipa::path(
    get,
    path = "/imagenes/{id}",
    tag = "imagenes",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record found", body = ApiResponse<GalleryRecordDto>),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_image(
    State(service): State<Arc<GalleryService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GalleryRecordDto>>> {
    let record = service.get(&id).await?;

    Ok(Json(ApiResponse::success(
        Some(record),
        Some("Imagen encontrada correctamente.".to_string()),
    )))
}

/// Update name and description of a record
#[utoipa::path(
    put,
    path = "/imagenes/{id}",
    tag = "imagenes",
    params(("id" = String, Path, description = "Record id")),
    request_body(content = UpdateImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record updated", body = ApiResponse<UpdatedFieldsDto>),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Record not found")
    )
)]
pub async fn update_image(
    State(service): State<Arc<GalleryService>>,
    Path(id): Path<String>,
    form: FormFields,
) -> Result<Json<ApiResponse<UpdatedFieldsDto>>> {
    let metadata = read_metadata(&form)?;

    let updated = service.update_metadata(&id, metadata).await?;

    Ok(Json(ApiResponse::success(
        Some(updated),
        Some("Imagen actualizada correctamente.".to_string()),
    )))
}

/// Delete a record
#[utoipa::path(
    delete,
    path = "/imagenes/{id}",
    tag = "imagenes",
    params(("id" = String, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted", body = ApiResponse<DeletedImageDto>),
        (status = 404, description = "Record not found")
    )
)]
pub async fn delete_image(
    State(service): State<Arc<GalleryService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedImageDto>>> {
    let deleted = service.delete(&id).await?;

    Ok(Json(ApiResponse::success(
        Some(deleted),
        Some("Imagen eliminada correctamente.".to_string()),
    )))
}

/// Generate an AI image for an existing record
///
/// `model` selects the provider: "replicate" or "openai" (case-insensitive).
#[utoipa::path(
    post,
    path = "/imagenes/generar_imagen_ia",
    tag = "imagenes",
    request_body(content = GenerateImageForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Image generated", body = ApiResponse<GeneratedImageDto>),
        (status = 400, description = "Unknown provider, missing field or record without image"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn generate_image(
    State(service): State<Arc<GalleryService>>,
    form: FormFields,
) -> Result<Json<ApiResponse<GeneratedImageDto>>> {
    let options = read_generation_options(&form)?;
    let image_id = form.required_text(IMAGE_ID_FIELDS)?;

    let generated = service.generate_for_existing(&image_id, options).await?;
    let message = format!(
        "Imagen generada correctamente usando {}.",
        generated.model_used
    );

    Ok(Json(ApiResponse::success(Some(generated), Some(message))))
}

/// Upload an image and generate its AI derivative in one call
///
/// The record is only created once both the generation and the copy of the
/// generated image into storage succeed.
#[utoipa::path(
    post,
    path = "/imagenes/subir_y_generar_ia",
    tag = "imagenes",
    request_body(content = UploadAndGenerateForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record created with generated image", body = ApiResponse<GalleryRecordDto>),
        (status = 400, description = "Unknown provider, missing field or invalid image"),
        (status = 500, description = "Provider, download or storage failure")
    )
)]
pub async fn upload_and_generate(
    State(service): State<Arc<GalleryService>>,
    mut form: FormFields,
) -> Result<Json<ApiResponse<GalleryRecordDto>>> {
    let options = read_generation_options(&form)?;
    let metadata = read_metadata(&form)?;
    let image = read_image(&mut form)?;

    let record = service.create_and_generate(metadata, image, options).await?;

    Ok(Json(ApiResponse::success(
        Some(record),
        Some("Imagen subida y generada correctamente.".to_string()),
    )))
}

fn read_metadata(form: &FormFields) -> Result<GalleryMetadataDto> {
    let metadata = GalleryMetadataDto {
        name: form.required_text(NAME_FIELDS)?,
        description: form.required_text(DESCRIPTION_FIELDS)?,
    };
    metadata
        .validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;
    Ok(metadata)
}

/// Provider is parsed first so an unknown one is rejected before any upload
fn read_generation_options(form: &FormFields) -> Result<GenerationOptions> {
    let provider = form
        .required_text(MODEL_FIELDS)?
        .parse::<ImageProvider>()?;

    let options = GenerationOptions {
        prompt: form.required_text(PROMPT_FIELDS)?,
        provider,
        style: form.text(STYLE_FIELDS),
    };
    options
        .validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;
    Ok(options)
}

fn read_image(form: &mut FormFields) -> Result<UploadedFile> {
    let image = form
        .take_file(IMAGE_FIELDS)
        .ok_or_else(|| AppError::InvalidArgument("El campo 'image' es obligatorio".to_string()))?;

    if image.data.is_empty() {
        return Err(AppError::InvalidArgument(
            "La imagen está vacía".to_string(),
        ));
    }

    if image.data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::InvalidArgument(format!(
            "La imagen es demasiado grande. Tamaño máximo: {} MB",
            MAX_IMAGE_SIZE / 1024 / 1024
        )));
    }

    if !is_image_type_allowed(&image.content_type) {
        return Err(AppError::InvalidArgument(format!(
            "Tipo de archivo '{}' no permitido. Tipos permitidos: {}",
            image.content_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    Ok(image)
}
