use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::shared::constants::content_type_for_file_name;

/// A file part received through `multipart/form-data`
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Form extractor accepting both `multipart/form-data` and
/// `application/x-www-form-urlencoded` bodies.
///
/// Text fields are looked up by a list of accepted names so the Spanish
/// field names of the first API version keep working.
#[derive(Debug, Default)]
pub struct FormFields {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                AppError::InvalidArgument(format!("Formulario multipart inválido: {}", e))
            })?;
            Self::from_multipart(multipart).await
        } else {
            let Form(texts) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidArgument(format!("Formulario inválido: {}", e)))?;
            Ok(Self {
                texts,
                files: HashMap::new(),
            })
        }
    }
}

impl FormFields {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::InvalidArgument(format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .filter(|ct| ct != "application/octet-stream")
                        .or_else(|| content_type_for_file_name(&file_name).map(str::to_string))
                        .unwrap_or_else(|| "application/octet-stream".to_string());

                    let data = field.bytes().await.map_err(|e| {
                        debug!("Failed to read file bytes: {}", e);
                        AppError::InvalidArgument(format!("Failed to read file data: {}", e))
                    })?;

                    fields.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        AppError::InvalidArgument(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    fields.texts.insert(name, text);
                }
            }
        }

        Ok(fields)
    }

    /// First non-blank value among `names`
    pub fn text(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.texts.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Like [`FormFields::text`], failing when the field is absent; the
    /// first name is the one reported to the caller.
    pub fn required_text(&self, names: &[&str]) -> Result<String> {
        self.text(names).ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "El campo '{}' es obligatorio",
                names.first().copied().unwrap_or_default()
            ))
        })
    }

    pub fn take_file(&mut self, names: &[&str]) -> Option<UploadedFile> {
        names.iter().find_map(|name| self.files.remove(*name))
    }
}
