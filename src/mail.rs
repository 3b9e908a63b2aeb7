//! Mailbox collaborator: unread listing and bulk delete / mark-read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::ResponseError;

pub mod auth;
pub mod gmail;

pub use auth::{authorize, AuthorizedUser, ClientSecrets, CredentialStore, OAuthClient};
pub use gmail::GmailClient;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Mail API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authorization error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResponseError> for MailError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Status { status, message } => MailError::Api {
                status: status.as_u16(),
                message,
            },
            ResponseError::Http(e) => MailError::Http(e),
            ResponseError::Parse(e) => MailError::Parse(e),
        }
    }
}

/// Id and preview text of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSummary {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
}

/// Mailbox operations used by the spam sweep.
///
/// The mailbox is treated as externally consistent; implementations do no
/// local locking.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Most recent unread messages, at most `quantity`.
    async fn list_unread(&self, quantity: usize) -> Result<Vec<MailSummary>, MailError>;

    async fn get(&self, id: &str) -> Result<MailSummary, MailError>;

    /// Permanently delete every message in `ids`.
    async fn batch_delete(&self, ids: &[String]) -> Result<(), MailError>;

    /// Remove the unread label from every message in `ids`.
    async fn batch_mark_read(&self, ids: &[String]) -> Result<(), MailError>;
}
