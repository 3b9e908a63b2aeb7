//! Local model client for the Ollama `generate` endpoint.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ClientError, Configured};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::options::{ModelOptions, TransportOptions};

/// Ollama-specific generation options.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaModel {
    /// How long the model stays loaded after the request (e.g. "5m").
    pub keep_alive: Option<String>,
}

/// Single synchronous prompt/response client. No retries, no streaming.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model_options: ModelOptions<OllamaModel>,
    transport_options: TransportOptions,
}

/// Body returned by a non-streaming generate call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    /// Generated text. With JSON format enabled this is itself a JSON document.
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

impl OllamaClient {
    pub fn new(
        base_url: String,
        model_options: ModelOptions<OllamaModel>,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            transport_options,
        }
    }

    /// Send one prompt and wait for the full response.
    ///
    /// With `json_format` the model is constrained to emit a JSON document.
    pub async fn generate(
        &self,
        prompt: &str,
        json_format: bool,
    ) -> Result<GenerateResponse, ClientError> {
        if self.model_options.model.is_empty() {
            return Err(ClientError::Config("Model must be specified".to_string()));
        }

        let url = format!("{}/api/generate", self.base_url);
        debug!("POST {}", url);

        let sampling = match (self.model_options.temperature, self.model_options.top_p) {
            (None, None) => None,
            (temperature, top_p) => Some(SamplingOptions { temperature, top_p }),
        };

        let body = GenerateRequest {
            model: &self.model_options.model,
            prompt,
            system: self.model_options.instructions.as_deref(),
            format: json_format.then_some("json"),
            stream: false,
            options: sampling,
            keep_alive: self.model_options.provider.keep_alive.as_deref(),
        };

        let http_client = build_http_client(&self.transport_options)?;
        let req = http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json");
        let req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(&body).send().await?.json_checked().await?;
        Ok(response)
    }
}

impl Configured for OllamaClient {
    type ModelProvider = OllamaModel;

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: Option<&'a str>,
    format: Option<&'a str>,
    stream: bool,
    options: Option<SamplingOptions>,
    keep_alive: Option<&'a str>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: Option<f32>,
    top_p: Option<f32>,
}
