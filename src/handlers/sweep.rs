//! Mailbox spam sweep: delete what the model flagged, mark the rest as read.

use itertools::{Either, Itertools};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::mail::{MailError, Mailbox};
use crate::tool;
use crate::tools::ToolError;

/// One message with the model's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassifiedMessage {
    /// The id of the message
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// The snippet of the message
    pub snippet: String,
    /// the decision
    pub is_spam_or_marketing: bool,
    /// The reason why the message is spam
    pub reason: String,
}

/// Models often echo numeric ids back as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SweepInput {
    /// The list of messages to filter
    pub messages: Vec<ClassifiedMessage>,
}

/// Ids to delete and ids to mark as read, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepPlan {
    pub delete: Vec<String>,
    pub mark_read: Vec<String>,
}

impl SweepPlan {
    /// Every message lands in exactly one of the two sets.
    pub fn from_verdicts(messages: &[ClassifiedMessage]) -> Self {
        let (delete, mark_read): (Vec<String>, Vec<String>) = messages.iter().partition_map(|m| {
            if m.is_spam_or_marketing {
                Either::Left(m.id.clone())
            } else {
                Either::Right(m.id.clone())
            }
        });
        Self { delete, mark_read }
    }
}

/// Result of both bulk operations. Neither is rolled back if the other fails.
#[derive(Debug)]
pub struct SweepOutcome {
    pub plan: SweepPlan,
    pub deleted: Result<(), MailError>,
    pub marked_read: Result<(), MailError>,
}

impl SweepOutcome {
    pub fn is_success(&self) -> bool {
        self.deleted.is_ok() && self.marked_read.is_ok()
    }

    pub fn report(&self) -> SweepReport {
        let mut errors = Vec::new();
        if let Err(e) = &self.deleted {
            errors.push(format!("delete failed: {}", e));
        }
        if let Err(e) = &self.marked_read {
            errors.push(format!("mark as read failed: {}", e));
        }
        SweepReport {
            success: self.is_success(),
            deleted: match self.deleted {
                Ok(()) => self.plan.delete.clone(),
                Err(_) => Vec::new(),
            },
            marked_read: match self.marked_read {
                Ok(()) => self.plan.mark_read.clone(),
                Err(_) => Vec::new(),
            },
            errors,
        }
    }
}

/// Tool output returned to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub success: bool,
    pub deleted: Vec<String>,
    pub marked_read: Vec<String>,
    pub errors: Vec<String>,
}

/// Run both bulk operations concurrently and wait for both.
///
/// Empty id sets skip their request.
pub async fn apply(mailbox: &dyn Mailbox, plan: SweepPlan) -> SweepOutcome {
    let delete = async {
        if plan.delete.is_empty() {
            return Ok(());
        }
        mailbox.batch_delete(&plan.delete).await
    };
    let mark_read = async {
        if plan.mark_read.is_empty() {
            return Ok(());
        }
        mailbox.batch_mark_read(&plan.mark_read).await
    };

    let (deleted, marked_read) = futures::join!(delete, mark_read);

    match &deleted {
        Ok(()) => info!("messages deleted: {:?}", plan.delete),
        Err(e) => warn!("error deleting messages {:?}: {}", plan.delete, e),
    }
    match &marked_read {
        Ok(()) => info!("messages marked as read: {:?}", plan.mark_read),
        Err(e) => warn!("error marking messages as read {:?}: {}", plan.mark_read, e),
    }

    SweepOutcome {
        plan,
        deleted,
        marked_read,
    }
}

/// Batch form of `spam_message_filter`, acting on a real mailbox.
pub struct MailboxSweep {
    mailbox: Arc<dyn Mailbox>,
}

impl MailboxSweep {
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        Self { mailbox }
    }
}

#[tool(
    name = "spam_message_filter",
    description = "Filter spam messages and explain why it is spam"
)]
impl MailboxSweep {
    async fn call(&self, input: SweepInput) -> Result<SweepReport, ToolError> {
        let plan = SweepPlan::from_verdicts(&input.messages);
        info!(
            delete = plan.delete.len(),
            mark_read = plan.mark_read.len(),
            "Sweeping mailbox"
        );
        let outcome = apply(self.mailbox.as_ref(), plan).await;
        Ok(outcome.report())
    }
}
