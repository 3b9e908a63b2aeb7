//! Provider factories for the supported services.

use crate::client::Configured;
use crate::options::{ModelOptions, TransportOptions};

/// Trait for providers that can create configured clients.
pub trait Provider {
    /// The client type produced by this provider.
    type Client: Configured;

    /// Create a new client from the provider's credential (API key or endpoint).
    fn create(credential: String) -> Self::Client;

    /// Create a new client with custom options.
    fn create_with_options(
        credential: String,
        model_options: ModelOptions<<Self::Client as Configured>::ModelProvider>,
        transport_options: TransportOptions,
    ) -> Self::Client;
}

pub mod ollama;
pub mod openai;

// Re-export for convenience
pub use ollama::{Ollama, OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL};
pub use openai::{OpenAi, OpenAiClient, OpenAiModel, OPENAI_DEFAULT_MODEL, OPENAI_DEFAULT_URL};
