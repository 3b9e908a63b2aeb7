//! Run, tool call and thread message types shared by the dispatch loop and its clients.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Status of a remote run.
///
/// `Queued`, `InProgress` and `RequiresAction` form the active set; every other
/// status is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    #[serde(alias = "incomplete")]
    Failed,
    #[serde(alias = "cancelling")]
    Cancelled,
    Expired,
}

impl RunStatus {
    /// True while the remote service is still working on the run.
    pub fn is_active(self) -> bool {
        match self {
            RunStatus::Queued | RunStatus::InProgress | RunStatus::RequiresAction => true,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                false
            }
        }
    }
}

/// One asynchronous execution of a conversational turn.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
    pub required_action: Option<RequiredAction>,
}

impl Run {
    /// Tool calls the run is waiting on, if it is in `RequiresAction`.
    pub fn pending_tool_calls(&self) -> Option<&NonEmpty<ToolCallRequest>> {
        match (self.status, &self.required_action) {
            (RunStatus::RequiresAction, Some(action)) => Some(&action.submit_tool_outputs.tool_calls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredAction {
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: NonEmpty<ToolCallRequest>,
}

/// A request from the remote run to execute a named local function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireToolCall", into = "WireToolCall")]
pub struct ToolCallRequest {
    /// Correlation id used to return the result to the run.
    pub id: String,
    pub name: String,
    /// Raw serialized JSON arguments, as sent by the model.
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the argument payload.
    ///
    /// Empty, malformed or non-object payloads decode to an empty object.
    pub fn decode_arguments(&self) -> Value {
        if self.arguments.trim().is_empty() {
            return Value::Object(Map::new());
        }
        match serde_json::from_str::<Value>(&self.arguments) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                warn!(
                    "Tool call {} ({}) arguments are not an object ({}), using empty arguments",
                    self.id, self.name, other
                );
                Value::Object(Map::new())
            }
            Err(e) => {
                warn!(
                    "Tool call {} ({}) has malformed arguments, using empty arguments: {}",
                    self.id, self.name, e
                );
                Value::Object(Map::new())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<WireToolCall> for ToolCallRequest {
    fn from(wire: WireToolCall) -> Self {
        ToolCallRequest {
            id: wire.id,
            name: wire.function.name,
            arguments: wire.function.arguments,
        }
    }
}

impl From<ToolCallRequest> for WireToolCall {
    fn from(call: ToolCallRequest) -> Self {
        WireToolCall {
            id: call.id,
            call_type: function_type(),
            function: WireFunction {
                name: call.name,
                arguments: call.arguments,
            },
        }
    }
}

/// Output of a local tool, correlated to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolResult {
    /// Build a result from a handler's JSON output.
    ///
    /// Strings are sent verbatim, everything else is serialized.
    pub fn from_value(tool_call_id: impl Into<String>, value: &Value) -> Self {
        let output = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            tool_call_id: tool_call_id.into(),
            output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message stored on a conversation thread.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: Role,
    pub run_id: Option<String>,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// First text part of the message, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        MessageContent::Text {
            text: TextValue {
                value: value.into(),
            },
        }
    }
}

/// Conversation state threaded through successive exchanges.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub thread_id: String,
    serviced_calls: HashSet<String>,
    tool_uses: HashMap<String, usize>,
}

impl Session {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }

    /// True once the given tool has been run in this conversation.
    pub fn has_used(&self, tool: &str) -> bool {
        self.tool_uses.get(tool).is_some_and(|n| *n > 0)
    }

    /// Number of times the given tool has been run in this conversation.
    pub fn uses_of(&self, tool: &str) -> usize {
        self.tool_uses.get(tool).copied().unwrap_or(0)
    }

    pub fn was_serviced(&self, tool_call_id: &str) -> bool {
        self.serviced_calls.contains(tool_call_id)
    }

    pub(crate) fn record(&mut self, call: &ToolCallRequest) {
        self.serviced_calls.insert(call.id.clone());
        *self.tool_uses.entry(call.name.clone()).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn active_set_is_exactly_the_first_three() {
        let active: Vec<_> = [
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::RequiresAction,
            RunStatus::Completed,
            RunStatus::Failed,
            RunStatus::Cancelled,
            RunStatus::Expired,
        ]
        .into_iter()
        .filter(|s| s.is_active())
        .collect();
        assert_eq!(
            active,
            vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::RequiresAction]
        );
    }

    #[test]
    fn transient_wire_statuses_map_to_terminal_variants() {
        let cancelling: RunStatus = serde_json::from_value(json!("cancelling")).unwrap();
        let incomplete: RunStatus = serde_json::from_value(json!("incomplete")).unwrap();
        assert_eq!(cancelling, RunStatus::Cancelled);
        assert_eq!(incomplete, RunStatus::Failed);
    }

    #[test]
    fn run_with_required_action_decodes_tool_calls() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1",
            "object": "thread.run",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_outputs",
                "submit_tool_outputs": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "display_quiz", "arguments": "{\"title\":\"t\"}" }
                    }]
                }
            }
        }))
        .unwrap();

        let calls = run.pending_tool_calls().unwrap();
        assert_eq!(calls.head.id, "call_1");
        assert_eq!(calls.head.name, "display_quiz");
        assert_eq!(calls.head.decode_arguments(), json!({"title": "t"}));
    }

    #[test]
    fn requires_action_without_calls_is_rejected() {
        let err = serde_json::from_value::<Run>(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": "requires_action",
            "required_action": { "submit_tool_outputs": { "tool_calls": [] } }
        }));
        assert!(err.is_err());
    }

    #[test]
    fn malformed_arguments_decode_to_empty_object() {
        for raw in ["", "   ", "{not json", "[1,2]"] {
            let call = ToolCallRequest::new("c", "t", raw);
            assert_eq!(call.decode_arguments(), json!({}), "raw: {raw:?}");
        }
    }

    #[test]
    fn string_results_are_sent_verbatim() {
        let text = ToolResult::from_value("c1", &json!("Message: hi\n"));
        let object = ToolResult::from_value("c2", &json!({"success": true}));
        assert_eq!(text.output, "Message: hi\n");
        assert_eq!(object.output, r#"{"success":true}"#);
    }

    #[test]
    fn message_text_skips_non_text_parts() {
        let message: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "role": "assistant",
            "run_id": "run_1",
            "content": [
                { "type": "image_file", "image_file": { "file_id": "f" } },
                { "type": "text", "text": { "value": "Hello", "annotations": [] } }
            ]
        }))
        .unwrap();
        assert_eq!(message.text(), Some("Hello"));
    }
}
