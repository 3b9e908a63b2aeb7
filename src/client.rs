//! Conversation client trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::http::ResponseError;
use crate::model::{Role, Run, ThreadMessage, ToolResult};
use crate::options::{ModelOptions, TransportOptions};
use crate::tools::ToolDefinition;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ResponseError> for ClientError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Status { status, message } => ClientError::Api {
                status: status.as_u16(),
                message,
            },
            ResponseError::Http(e) => ClientError::Http(e),
            ResponseError::Parse(e) => ClientError::Parse(e),
        }
    }
}

/// An assistant as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assistant {
    pub id: String,
    pub name: Option<String>,
}

/// Tools an assistant can be created with.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantTool {
    CodeInterpreter,
    Function(ToolDefinition),
}

/// Black-box asynchronous job API behind the dispatch loop.
///
/// Every method maps to one remote call; none of them retry.
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Create an assistant with the given name and tools.
    ///
    /// Model and instructions come from the client's model options.
    async fn create_assistant(
        &self,
        name: &str,
        tools: Vec<AssistantTool>,
    ) -> Result<Assistant, ClientError>;

    /// Look up an existing assistant by id.
    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, ClientError>;

    /// Create an empty conversation thread and return its id.
    async fn create_thread(&self) -> Result<String, ClientError>;

    /// Append a message to a thread.
    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage, ClientError>;

    /// Start a run of `assistant_id` over the thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ClientError>;

    /// Fetch the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ClientError>;

    /// Return tool outputs to a run waiting in `requires_action`.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolResult>,
    ) -> Result<Run, ClientError>;

    /// List thread messages, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ClientError>;
}

/// Clients that carry model and transport configuration.
pub trait Configured {
    /// Provider-specific model options type.
    type ModelProvider: Send + Sync;

    /// Get reference to the model options.
    fn model_options(&self) -> &ModelOptions<Self::ModelProvider>;

    /// Get reference to the transport options.
    fn transport_options(&self) -> &TransportOptions;
}
