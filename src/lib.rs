//! # runcall - drive assistant runs with local tool calls
//!
//! A small library for the recurring shape of conversational-AI demos: post a
//! user turn, start a remote run, poll it, execute whatever local function the
//! model asks for, and return the final reply.
//!
//! ## Architecture
//!
//! 1. **Providers** act as factories to create clients.
//! 2. **Clients** store authentication and configuration and speak one wire format.
//! 3. **Agents** wrap a conversation client and a tool registry and run the
//!    poll/dispatch loop.
//!
//! ### Core Types
//!
//! - **`ConversationClient`**: Trait for the remote thread/run API.
//! - **`ToolHandler`** / **`ToolRegistry`**: Named local functions and their lookup.
//! - **`Agent`**: The tool-call dispatch loop.
//! - **`Session`**: Per-conversation state threaded through exchanges.
//! - **`Mailbox`**: Mail collaborator used by the spam sweep.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use runcall::console::Terminal;
//! use runcall::handlers::AllowMessage;
//! use runcall::providers::{OpenAi, Provider};
//! use runcall::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAi::create("your-api-key".to_string());
//!     let agent = Agent::new(client).with_tool(AllowMessage::new(Arc::new(Terminal::new())));
//!
//!     let mut session = agent.start_session().await?;
//!     let reply = agent.exchange(&mut session, "asst_123", "Hi, lunch at noon?").await?;
//!     println!("{}", reply.unwrap_or_default());
//!     Ok(())
//! }
//! ```

extern crate self as runcall;

pub mod agent;
pub mod api;
pub mod classify;
pub mod cli;
pub mod client;
pub mod config;
pub mod console;
pub mod handlers;
pub mod http;
pub mod mail;
pub mod model;
pub mod options;
pub mod providers;
pub mod tools;

pub use agent::{Agent, AgentError};
pub use client::{ClientError, ConversationClient};
pub use mail::{MailError, Mailbox};
pub use model::{Run, RunStatus, Session, ToolCallRequest, ToolResult};
pub use tools::{ToolDefinition, ToolError, ToolHandler, ToolRegistry};

// Re-export the proc macro attribute
pub use runcall_macros::tool;

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use serde_json;
}
