//! Single-message routing tools: the assistant picks one of these per message.

use crossterm::style::Stylize;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::console::Console;
use crate::tool;
use crate::tools::ToolError;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SpamReport {
    /// The message to filter
    pub message: String,
    /// The reason why the message is spam
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AllowedMessage {
    /// The message to allow
    pub message: String,
    /// The reason why the message is allowed
    #[serde(default)]
    pub reason: Option<String>,
}

/// Text echoed back to the run so the assistant can say which tool ran.
pub fn decision_echo(message: &str, reason: &str) -> String {
    format!("Message: {}\nReason: {}\n", message, reason)
}

async fn show(console: &dyn Console, header: String, message: &str, reason: &str) -> Result<(), ToolError> {
    let text = format!("{}\nMessage: {}\nReason: {}", header, message, reason);
    console
        .say(&text)
        .await
        .map_err(|e| ToolError::Failed(e.to_string()))
}

/// Handles `spam_message_filter` for a single message.
pub struct SpamMessageFilter {
    console: Arc<dyn Console>,
}

impl SpamMessageFilter {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[tool(
    name = "spam_message_filter",
    description = "Filter spam messages and explain why it is spam"
)]
impl SpamMessageFilter {
    async fn call(&self, input: SpamReport) -> Result<String, ToolError> {
        info!(decision = "spam", reason = %input.reason, "Classified message");
        show(
            self.console.as_ref(),
            "Spam Message".red().to_string(),
            &input.message,
            &input.reason,
        )
        .await?;
        Ok(decision_echo(&input.message, &input.reason))
    }
}

/// Handles `allow_message` for a single message.
pub struct AllowMessage {
    console: Arc<dyn Console>,
}

impl AllowMessage {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[tool(name = "allow_message", description = "Allow a message to be sent")]
impl AllowMessage {
    async fn call(&self, input: AllowedMessage) -> Result<String, ToolError> {
        let reason = input.reason.unwrap_or_default();
        info!(decision = "allow", reason = %reason, "Classified message");
        show(
            self.console.as_ref(),
            "Allow Message".green().to_string(),
            &input.message,
            &reason,
        )
        .await?;
        Ok(decision_echo(&input.message, &reason))
    }
}
