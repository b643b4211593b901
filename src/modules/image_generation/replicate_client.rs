use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GenerationBackend;
use crate::core::config::ReplicateConfig;
use crate::core::error::{AppError, Result};

/// Interval between polls while a prediction is still running
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    input: FluxKontextInput<'a>,
}

#[derive(Debug, Serialize)]
struct FluxKontextInput<'a> {
    prompt: &'a str,
    input_image: &'a str,
    aspect_ratio: &'a str,
    output_format: &'a str,
    safety_tolerance: u8,
    prompt_upsampling: bool,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

/// Client for Replicate's predictions API
pub struct ReplicateClient {
    http_client: reqwest::Client,
    api_token: Option<String>,
    base_url: String,
    model: String,
}

impl ReplicateClient {
    pub fn new(config: ReplicateConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_token: config.api_token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        }
    }

    fn token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| provider_error("REPLICATE_API_TOKEN no está configurado"))
    }

    async fn create_prediction(&self, body: &PredictionRequest<'_>) -> Result<Prediction> {
        let url = format!("{}/v1/models/{}/predictions", self.base_url, self.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.token()?)
            // Hold the connection until the prediction finishes when possible
            .header("Prefer", "wait")
            .json(body)
            .send()
            .await
            .map_err(provider_error)?;

        parse_prediction(response).await
    }

    async fn get_prediction(&self, url: &str) -> Result<Prediction> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(provider_error)?;

        parse_prediction(response).await
    }

    /// Poll until the prediction reaches a terminal status
    async fn wait_for(&self, mut prediction: Prediction) -> Result<Prediction> {
        while matches!(prediction.status.as_str(), "starting" | "processing") {
            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|u| u.get.clone())
                .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id));

            tracing::debug!(
                "Replicate prediction {} is {}, polling",
                prediction.id,
                prediction.status
            );
            tokio::time::sleep(POLL_INTERVAL).await;
            prediction = self.get_prediction(&poll_url).await?;
        }

        Ok(prediction)
    }
}

#[async_trait]
impl GenerationBackend for ReplicateClient {
    async fn generate(
        &self,
        prompt: &str,
        source_url: &str,
        _style: Option<&str>,
    ) -> Result<String> {
        let body = PredictionRequest {
            input: FluxKontextInput {
                prompt,
                input_image: source_url,
                aspect_ratio: "match_input_image",
                output_format: "jpg",
                safety_tolerance: 2,
                prompt_upsampling: false,
            },
        };

        let prediction = self.create_prediction(&body).await?;
        let prediction = self.wait_for(prediction).await?;

        if prediction.status != "succeeded" {
            let reason = match &prediction.error {
                Value::Null => format!("la predicción terminó con estado '{}'", prediction.status),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(provider_error(reason));
        }

        let url = extract_output_url(&prediction.output)
            .ok_or_else(|| provider_error("la predicción no devolvió ninguna imagen"))?;

        tracing::info!("Replicate prediction {} succeeded", prediction.id);
        Ok(url)
    }
}

async fn parse_prediction(response: reqwest::Response) -> Result<Prediction> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        return Err(provider_error(format!("HTTP {} - {}", status, detail)));
    }

    response
        .json::<Prediction>()
        .await
        .map_err(|e| provider_error(format!("respuesta inválida: {}", e)))
}

/// Model output is either one value or a list; take the first value and use
/// its `url` field when it is an object.
fn extract_output_url(output: &Value) -> Option<String> {
    let first = match output {
        Value::Array(items) => items.first()?,
        Value::Null => return None,
        other => other,
    };

    match first {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => match map.get("url") {
            Some(Value::String(url)) => Some(url.clone()),
            _ => Some(first.to_string()),
        },
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn provider_error(detail: impl std::fmt::Display) -> AppError {
    AppError::Provider(format!("Error con Replicate: {}", detail))
}
