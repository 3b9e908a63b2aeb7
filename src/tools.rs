//! Tool system for dispatching remote tool calls to local handlers.

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::model::{ToolCallRequest, ToolResult};

/// Error type for tool lookup and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool error: {0}")]
    Failed(String),
}

/// Function definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// JSON schema for a tool input type, with nested types inlined.
pub fn schema_for<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({}));
    if let Value::Object(map) = &mut value {
        map.remove("title");
        map.remove("definitions");
    }
    value
}

/// A local function the remote model can ask us to run.
///
/// Usually implemented through the `#[tool]` attribute.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name the model uses to request this tool.
    fn name(&self) -> &str;

    /// Definition to register with the assistant.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool.
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;
}

/// Handlers keyed by tool name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler with the same name.
    pub fn with_handler<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.register(Arc::new(handler));
        self
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            debug!("Replaced handler for tool {}", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Route a tool call to the handler registered under its name.
    ///
    /// Fails with [`ToolError::UnknownTool`] without running anything when no
    /// handler matches.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<ToolResult, ToolError> {
        let handler = self
            .handlers
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let args = call.decode_arguments();
        info!("Tool call requested: {} ({})", call.name, call.id);
        debug!("Tool arguments: {}", args);

        let output = handler.invoke(args).await?;
        debug!("Tool result: {}", output);

        Ok(ToolResult::from_value(call.id.clone(), &output))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
