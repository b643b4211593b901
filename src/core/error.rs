use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Provider(_)
            | AppError::Fetch(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Error al acceder a la base de datos".to_string()
            }
            AppError::NotFound(msg) | AppError::InvalidArgument(msg) => msg,
            AppError::InvalidState(msg) => msg,
            AppError::Provider(msg) => {
                tracing::error!("Image provider error: {}", msg);
                format!("Error al generar la imagen: {}", msg)
            }
            AppError::Fetch(msg) => {
                tracing::error!("Rehost fetch error: {}", msg);
                format!("Error al descargar la imagen generada: {}", msg)
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                format!("Error al guardar la imagen: {}", msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
