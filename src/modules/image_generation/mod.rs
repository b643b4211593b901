//! Image generation vendors behind one call signature
//!
//! | Provider | Flow |
//! |----------|------|
//! | `replicate` | Flux Kontext Pro edits the source image directly |
//! | `openai` | GPT-4o describes the source image, DALL-E 3 draws from the description |

mod openai_client;
mod replicate_client;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};

pub use openai_client::OpenAiClient;
pub use replicate_client::ReplicateClient;

/// One vendor able to turn a source image plus a prompt into a new image
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Returns the vendor-hosted URL of the generated image
    async fn generate(&self, prompt: &str, source_url: &str, style: Option<&str>)
        -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    Replicate,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ImageProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            ImageProvider::Replicate => "Replicate (Flux Kontext Pro)",
            ImageProvider::OpenAi => "OpenAI (DALL-E 3)",
        }
    }
}

impl FromStr for ImageProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "replicate" => Ok(ImageProvider::Replicate),
            "openai" => Ok(ImageProvider::OpenAi),
            _ => Err(AppError::InvalidArgument(
                "Model debe ser 'replicate' o 'openai'".to_string(),
            )),
        }
    }
}

impl fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageProvider::Replicate => f.write_str("replicate"),
            ImageProvider::OpenAi => f.write_str("openai"),
        }
    }
}

/// Dispatches a generation request to the selected provider
pub struct ImageGenerator {
    replicate: Arc<dyn GenerationBackend>,
    openai: Arc<dyn GenerationBackend>,
}

impl ImageGenerator {
    pub fn new(replicate: Arc<dyn GenerationBackend>, openai: Arc<dyn GenerationBackend>) -> Self {
        Self { replicate, openai }
    }

    pub async fn generate(
        &self,
        provider: ImageProvider,
        prompt: &str,
        source_url: &str,
        style: Option<&str>,
    ) -> Result<String> {
        tracing::info!(
            "Generating image with {}: source={}",
            provider.display_name(),
            source_url
        );

        let backend = match provider {
            ImageProvider::Replicate => &self.replicate,
            ImageProvider::OpenAi => &self.openai,
        };

        backend.generate(prompt, source_url, style).await
    }
}
