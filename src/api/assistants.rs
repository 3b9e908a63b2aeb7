//! Assistants v2 REST client (assistants, threads, messages, runs).

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::{Assistant, AssistantTool, ClientError, Configured, ConversationClient};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{Role, Run, ThreadMessage, ToolResult};
use crate::options::{ModelOptions, TransportOptions};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

/// Provider-specific assistant options, flattened into assistant creation requests.
pub trait AssistantsModel:
    Send + Sync + Default + Serialize + for<'de> Deserialize<'de> + Clone
{
}

/// Client for an Assistants-compatible API.
#[derive(Debug, Clone)]
pub struct AssistantsClient<M> {
    api_key: String,
    base_url: String,
    model_options: ModelOptions<M>,
    transport_options: TransportOptions,
}

impl<M: AssistantsModel> AssistantsClient<M> {
    /// Create a new client.
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<M>,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            transport_options,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = format!("{}/v1/{}", self.base_url, path);
        debug!("{} {}", method, url);

        let http_client = build_http_client(&self.transport_options)?;
        let req = http_client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(BETA_HEADER, BETA_VALUE);

        Ok(add_extra_headers(req, &self.transport_options))
    }
}

#[async_trait]
impl<M: AssistantsModel> ConversationClient for AssistantsClient<M> {
    async fn create_assistant(
        &self,
        name: &str,
        tools: Vec<AssistantTool>,
    ) -> Result<Assistant, ClientError> {
        if self.model_options.model.is_empty() {
            return Err(ClientError::Config("Model must be specified".to_string()));
        }

        let body = CreateAssistantRequest {
            model: self.model_options.model.clone(),
            name: Some(name.to_string()),
            instructions: self.model_options.instructions.clone(),
            tools: tools.into_iter().map(WireTool::from).collect(),
            temperature: self.model_options.temperature,
            top_p: self.model_options.top_p,
            provider_options: self.model_options.provider.clone(),
        };

        let assistant: WireAssistant = self
            .request(Method::POST, "assistants")?
            .json_logged(&body)
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(assistant.into())
    }

    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant, ClientError> {
        let assistant: WireAssistant = self
            .request(Method::GET, &format!("assistants/{}", assistant_id))?
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(assistant.into())
    }

    async fn create_thread(&self) -> Result<String, ClientError> {
        let thread: WireThread = self
            .request(Method::POST, "threads")?
            .json_logged(&serde_json::json!({}))
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(thread.id)
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage, ClientError> {
        let body = CreateMessageRequest { role, content };
        let message = self
            .request(Method::POST, &format!("threads/{}/messages", thread_id))?
            .json_logged(&body)
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(message)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ClientError> {
        let body = CreateRunRequest { assistant_id };
        let run = self
            .request(Method::POST, &format!("threads/{}/runs", thread_id))?
            .json_logged(&body)
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ClientError> {
        let run = self
            .request(Method::GET, &format!("threads/{}/runs/{}", thread_id, run_id))?
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(run)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolResult>,
    ) -> Result<Run, ClientError> {
        let body = SubmitToolOutputsRequest {
            tool_outputs: outputs,
        };
        let run = self
            .request(
                Method::POST,
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            )?
            .json_logged(&body)
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(run)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ClientError> {
        // Newest first so the latest turn is always inside the first page.
        let list: MessageList = self
            .request(Method::GET, &format!("threads/{}/messages", thread_id))?
            .query(&[("order", "desc"), ("limit", "100")])
            .send()
            .await?
            .json_checked()
            .await?;

        let mut messages = list.data;
        messages.reverse();
        Ok(messages)
    }
}

impl<M: AssistantsModel> Configured for AssistantsClient<M> {
    type ModelProvider = M;

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

// --- Assistants API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct CreateAssistantRequest<M> {
    model: String,
    name: Option<String>,
    instructions: Option<String>,
    tools: Vec<WireTool>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    #[serde(flatten)]
    provider_options: M,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireTool {
    CodeInterpreter,
    Function { function: WireFunction },
}

#[derive(Debug, Clone, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl From<AssistantTool> for WireTool {
    fn from(tool: AssistantTool) -> Self {
        match tool {
            AssistantTool::CodeInterpreter => WireTool::CodeInterpreter,
            AssistantTool::Function(def) => WireTool::Function {
                function: WireFunction {
                    name: def.name,
                    description: def.description,
                    parameters: def.parameters,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireAssistant {
    id: String,
    name: Option<String>,
}

impl From<WireAssistant> for Assistant {
    fn from(wire: WireAssistant) -> Self {
        Assistant {
            id: wire.id,
            name: wire.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireThread {
    id: String,
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct SubmitToolOutputsRequest {
    tool_outputs: Vec<ToolResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}
