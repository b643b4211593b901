use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::gallery::handlers::{
    create_image, delete_image, generate_image, get_image, list_images, update_image,
    upload_and_generate,
};
use crate::features::gallery::services::GalleryService;
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Create routes for the gallery feature
///
/// Both `/imagenes` and `/imagenes/` are served so clients of either style work.
pub fn routes(service: Arc<GalleryService>) -> Router {
    // Allow body size up to MAX_IMAGE_SIZE + buffer for multipart overhead
    let upload_limit = DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024);

    Router::new()
        .route(
            "/imagenes",
            get(list_images).post(create_image).layer(upload_limit),
        )
        .route(
            "/imagenes/",
            get(list_images).post(create_image).layer(upload_limit),
        )
        .route("/imagenes/generar_imagen_ia", post(generate_image))
        .route(
            "/imagenes/subir_y_generar_ia",
            post(upload_and_generate).layer(upload_limit),
        )
        .route(
            "/imagenes/{id}",
            get(get_image).put(update_image).delete(delete_image),
        )
        .with_state(service)
}
