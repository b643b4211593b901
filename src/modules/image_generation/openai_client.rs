use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::GenerationBackend;
use crate::core::config::OpenAiConfig;
use crate::core::error::{AppError, Result};

/// Instruction sent with the source image to obtain a reusable description
const DESCRIBE_INSTRUCTION: &str = "Describe que es lo que hay en la imagen, como una referencia \
     para despues ser usada como referencia para generar una nueva imagen con un estilo distinto:";

const DEFAULT_STYLE: &str = "vivid";
const IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

/// OpenAI error envelope: `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Client for the OpenAI chat completions and image generation APIs
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    vision_model: String,
    image_model: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vision_model: config.vision_model,
            image_model: config.image_model,
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error("OPENAI_API_KEY no está configurado"))?;

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(provider_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::error!("OpenAI API error: HTTP {} - {}", status, message);
            return Err(provider_error(format!("HTTP {} - {}", status, message)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| provider_error(format!("respuesta inválida: {}", e)))
    }

    /// Ask the vision model for a description of the source image
    async fn describe_image(&self, source_url: &str) -> Result<String> {
        let body = json!({
            "model": self.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": DESCRIBE_INSTRUCTION},
                    {"type": "image_url", "image_url": {"url": source_url}}
                ]
            }]
        });

        let completion: ChatCompletionResponse = self.post("/v1/chat/completions", &body).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| provider_error("la descripción de la imagen llegó vacía"))
    }

    async fn draw(&self, prompt: &str, style: &str) -> Result<String> {
        let request = ImageGenerationRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
            style,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| AppError::Internal(format!("Failed to encode request: {}", e)))?;

        let response: ImageGenerationResponse =
            self.post("/v1/images/generations", &body).await?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| provider_error("no se devolvió ninguna imagen"))
    }
}

#[async_trait]
impl GenerationBackend for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        source_url: &str,
        style: Option<&str>,
    ) -> Result<String> {
        let description = self.describe_image(source_url).await?;
        tracing::debug!("Source image description: {}", description);

        let enhanced_prompt = enhanced_prompt(&description, prompt);
        let style = style
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STYLE);

        self.draw(&enhanced_prompt, style).await
    }
}

fn enhanced_prompt(description: &str, prompt: &str) -> String {
    format!(
        "Basado en la descripcion de la imagen: {}. {}",
        description, prompt
    )
}

fn provider_error(detail: impl std::fmt::Display) -> AppError {
    AppError::Provider(format!("Error con OpenAI: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: base_url.to_string(),
            vision_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
        })
    }

    fn chat_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    #[test]
    fn test_enhanced_prompt_prefixes_description() {
        assert_eq!(
            enhanced_prompt("un jarrón azul", "estilo acuarela"),
            "Basado en la descripcion de la imagen: un jarrón azul. estilo acuarela"
        );
    }

    #[tokio::test]
    async fn test_generate_describes_then_draws() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(chat_reply("a ceramic vase"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(body_partial_json(json!({
                "model": "dall-e-3",
                "prompt": "Basado en la descripcion de la imagen: a ceramic vase. pop art",
                "size": "1024x1024",
                "style": "natural"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"url": "https://oaidalle.test/img.png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server.uri())
            .generate("pop art", "https://blobs/vase.png", Some("natural"))
            .await
            .unwrap();

        assert_eq!(url, "https://oaidalle.test/img.png");
    }

    #[tokio::test]
    async fn test_style_defaults_to_vivid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(chat_reply("a vase"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(body_partial_json(json!({"style": "vivid"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"url": "https://oaidalle.test/vivid.png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server.uri())
            .generate("p", "https://src", None)
            .await
            .unwrap();

        assert_eq!(url, "https://oaidalle.test/vivid.png");
    }

    #[tokio::test]
    async fn test_description_failure_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .generate("p", "https://src", None)
            .await
            .unwrap_err();

        match err {
            AppError::Provider(msg) => {
                assert!(msg.starts_with("Error con OpenAI"));
                assert!(msg.contains("Rate limit reached"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_provider_error() {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            vision_model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
        });

        let err = client.generate("p", "https://src", None).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }
}
