//! OpenAI Assistants provider.

use serde::{Deserialize, Serialize};

use crate::api::assistants::{AssistantsClient, AssistantsModel};
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;

pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4-1106-preview";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiModel;

impl AssistantsModel for OpenAiModel {}

pub type OpenAiClient = AssistantsClient<OpenAiModel>;

pub struct OpenAi;

impl OpenAi {
    /// Create a client against a compatible endpoint other than api.openai.com.
    pub fn create_with_base_url(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<OpenAiModel>,
        transport_options: TransportOptions,
    ) -> OpenAiClient {
        OpenAiClient::new(api_key, base_url, model_options, transport_options)
    }
}

impl Provider for OpenAi {
    type Client = OpenAiClient;

    fn create(api_key: String) -> Self::Client {
        OpenAiClient::new(
            api_key,
            OPENAI_DEFAULT_URL.to_string(),
            ModelOptions::new(OPENAI_DEFAULT_MODEL),
            TransportOptions::default(),
        )
    }

    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<OpenAiModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        OpenAiClient::new(
            api_key,
            OPENAI_DEFAULT_URL.to_string(),
            model_options,
            transport_options,
        )
    }
}
