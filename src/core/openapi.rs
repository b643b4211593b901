use utoipa::{Modify, OpenApi};

use crate::features::gallery::{dtos as gallery_dtos, handlers as gallery_handlers};
use crate::modules::image_generation::ImageProvider;
use crate::shared::types::{ApiResponse, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Gallery
        gallery_handlers::list_images,
        gallery_handlers::create_image,
        gallery_handlers::get_image,
        gallery_handlers::update_image,
        gallery_handlers::delete_image,
        gallery_handlers::generate_image,
        gallery_handlers::upload_and_generate,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            ImageProvider,
            // Gallery
            gallery_dtos::GalleryRecordDto,
            gallery_dtos::GalleryMetadataDto,
            gallery_dtos::UpdatedFieldsDto,
            gallery_dtos::DeletedImageDto,
            gallery_dtos::GeneratedImageDto,
            gallery_dtos::CreateImageForm,
            gallery_dtos::UpdateImageForm,
            gallery_dtos::GenerateImageForm,
            gallery_dtos::UploadAndGenerateForm,
            ApiResponse<gallery_dtos::GalleryRecordDto>,
            ApiResponse<Vec<gallery_dtos::GalleryRecordDto>>,
            ApiResponse<gallery_dtos::UpdatedFieldsDto>,
            ApiResponse<gallery_dtos::DeletedImageDto>,
            ApiResponse<gallery_dtos::GeneratedImageDto>,
        )
    ),
    tags(
        (name = "imagenes", description = "Image gallery with AI generation (public)"),
    ),
    info(
        title = "VR Backend API",
        version = "0.1.0",
        description = "API documentation for the VR image gallery",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
