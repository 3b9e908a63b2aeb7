//! Local Ollama provider.

use crate::api::ollama::{OllamaClient, OllamaModel};
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;

pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "gemma2:2b";

pub struct Ollama;

impl Provider for Ollama {
    type Client = OllamaClient;

    fn create(base_url: String) -> Self::Client {
        OllamaClient::new(
            base_url,
            ModelOptions::new(OLLAMA_DEFAULT_MODEL),
            TransportOptions::default(),
        )
    }

    fn create_with_options(
        base_url: String,
        model_options: ModelOptions<OllamaModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        OllamaClient::new(base_url, model_options, transport_options)
    }
}
