//! Tool-call dispatch loop driving assistant runs to completion.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ClientError, ConversationClient};
use crate::model::{Role, Run, RunStatus, Session, ToolCallRequest};
use crate::options::{RunOptions, ToolCallPolicy};
use crate::tools::{ToolError, ToolHandler, ToolRegistry};

/// Errors that abort an exchange.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Drives one conversational exchange at a time against a [`ConversationClient`].
///
/// For every user turn the agent:
/// 1. Posts the message to the session's thread
/// 2. Starts a run of the assistant
/// 3. Polls the run with a constant delay
/// 4. Executes the requested local tool whenever the run requires action and
///    submits its output
/// 5. Returns the assistant's reply once the run leaves the active set
///
/// # Example
/// ```ignore
/// let client = OpenAi::create(api_key);
/// let agent = Agent::new(client).with_tool(AllowMessage);
///
/// let mut session = agent.start_session().await?;
/// let reply = agent.exchange(&mut session, &assistant_id, "Hello").await?;
/// ```
pub struct Agent<C: ConversationClient> {
    client: C,
    registry: ToolRegistry,
    options: RunOptions,
}

impl<C: ConversationClient> Agent<C> {
    /// Create a new agent with no tools and default run options.
    pub fn new(client: C) -> Self {
        Self {
            client,
            registry: ToolRegistry::new(),
            options: RunOptions::default(),
        }
    }

    /// Register one more tool handler.
    pub fn with_tool<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.registry = self.registry.with_handler(handler);
        self
    }

    /// Set the run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Create a fresh conversation thread.
    pub async fn start_session(&self) -> Result<Session, AgentError> {
        let thread_id = self.client.create_thread().await?;
        info!("Started thread {}", thread_id);
        Ok(Session::new(thread_id))
    }

    /// Submit a user turn and drive the resulting run to a terminal status.
    ///
    /// # Returns
    /// The text of the assistant's latest reply for the run, or `None` when the
    /// run produced no assistant message.
    pub async fn exchange(
        &self,
        session: &mut Session,
        assistant_id: &str,
        user_message: &str,
    ) -> Result<Option<String>, AgentError> {
        debug!(
            "Posting user message ({} bytes) to thread {}",
            user_message.len(),
            session.thread_id
        );
        self.client
            .post_message(&session.thread_id, Role::User, user_message)
            .await?;

        let run = self
            .client
            .create_run(&session.thread_id, assistant_id)
            .await?;
        info!("Created run {} on thread {}", run.id, session.thread_id);

        let run = self.drive(session, &run.id).await?;
        Ok(self.last_reply(&session.thread_id, &run.id).await?)
    }

    /// Poll a run until it leaves the active set, servicing tool calls on the way.
    pub async fn drive(&self, session: &mut Session, run_id: &str) -> Result<Run, AgentError> {
        let mut run = self.client.retrieve_run(&session.thread_id, run_id).await?;

        while run.status.is_active() {
            debug!("Run {} is {:?}", run.id, run.status);
            if run.status == RunStatus::RequiresAction {
                self.service(session, &run).await?;
            }

            tokio::time::sleep(self.options.poll_interval).await;
            run = self.client.retrieve_run(&session.thread_id, run_id).await?;
        }

        match run.status {
            RunStatus::Completed => info!("Run {} completed", run.id),
            other => warn!("Run {} ended as {:?}", run.id, other),
        }
        Ok(run)
    }

    /// Execute the pending tool calls of a run and submit their outputs.
    async fn service(&self, session: &mut Session, run: &Run) -> Result<(), AgentError> {
        let Some(pending) = run.pending_tool_calls() else {
            warn!("Run {} requires action but carries no tool calls", run.id);
            return Ok(());
        };

        let selected: Vec<&ToolCallRequest> = match self.options.tool_call_policy {
            ToolCallPolicy::FirstOnly => {
                if pending.len() > 1 {
                    warn!(
                        "Run {} requested {} tool calls, servicing only the first",
                        run.id,
                        pending.len()
                    );
                }
                vec![&pending.head]
            }
            ToolCallPolicy::All => pending.iter().collect(),
        };

        // Unknown names fail the exchange before any handler runs.
        if let Some(unknown) = selected.iter().find(|c| !self.registry.contains(&c.name)) {
            return Err(ToolError::UnknownTool(unknown.name.clone()).into());
        }

        let mut outputs = Vec::with_capacity(selected.len());
        for call in selected {
            if session.was_serviced(&call.id) {
                debug!("Tool call {} already serviced, not invoking again", call.id);
                continue;
            }
            let result = self.registry.dispatch(call).await?;
            info!("Tool {} executed successfully", call.name);
            session.record(call);
            outputs.push(result);
        }

        if outputs.is_empty() {
            return Ok(());
        }

        self.client
            .submit_tool_outputs(&session.thread_id, &run.id, outputs)
            .await?;
        Ok(())
    }

    /// Latest assistant reply posted for `run_id`.
    ///
    /// Safe to call repeatedly once the run is terminal.
    pub async fn last_reply(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Option<String>, ClientError> {
        let messages = self.client.list_messages(thread_id).await?;
        let reply = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.run_id.as_deref() == Some(run_id))
            .and_then(|m| m.text())
            .map(str::to_string);

        if reply.is_none() {
            debug!("No assistant reply found for run {}", run_id);
        }
        Ok(reply)
    }
}
