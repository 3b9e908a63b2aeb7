//! Model, run and transport configuration.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::time::Duration;

/// Model behaviour parameters plus provider-specific configuration.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions<T> {
    /// Model identifier (e.g., "gpt-4-1106-preview", "gemma2:2b").
    pub model: String,

    /// Instructions given to the assistant, or a system prompt for one-shot models.
    pub instructions: Option<String>,

    /// Temperature for sampling (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Top-p (nucleus) sampling parameter.
    pub top_p: Option<f32>,

    /// Provider-specific model options.
    pub provider: T,
}

impl<T: Default> ModelOptions<T> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: None,
            temperature: None,
            top_p: None,
            provider: T::default(),
        }
    }

    /// Set the instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// How many of the pending tool calls are serviced per poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolCallPolicy {
    /// Service only the first pending call.
    #[default]
    FirstOnly,
    /// Service every pending call and submit all results together.
    All,
}

/// Dispatch loop configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Constant delay between status polls.
    pub poll_interval: Duration,
    pub tool_call_policy: ToolCallPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            tool_call_policy: ToolCallPolicy::FirstOnly,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the tool call policy.
    pub fn with_tool_call_policy(mut self, policy: ToolCallPolicy) -> Self {
        self.tool_call_policy = policy;
        self
    }
}

/// Per-client HTTP settings: request timeout and headers added to every call.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Falls back to reqwest's default when unset.
    pub timeout: Option<Duration>,
    pub headers: BTreeMap<String, String>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Add a header, replacing any earlier value under the same name.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}
