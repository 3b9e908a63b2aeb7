//! Gmail REST v1 implementation of [`Mailbox`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MailError, MailSummary, Mailbox};
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::options::TransportOptions;

pub const GMAIL_DEFAULT_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

const UNREAD_LABEL: &str = "UNREAD";

/// Gmail client acting for the authorized user (`users/me`).
#[derive(Debug, Clone)]
pub struct GmailClient {
    access_token: String,
    base_url: String,
    transport_options: TransportOptions,
}

impl GmailClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, GMAIL_DEFAULT_URL.to_string(), TransportOptions::default())
    }

    pub fn with_base_url(
        access_token: String,
        base_url: String,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            transport_options,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, MailError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {}", method, url);

        let http_client = build_http_client(&self.transport_options)?;
        let req = http_client
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token));
        Ok(add_extra_headers(req, &self.transport_options))
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_unread(&self, quantity: usize) -> Result<Vec<MailSummary>, MailError> {
        let max_results = quantity.to_string();
        let list: MessageList = self
            .request(Method::GET, "messages")?
            .query(&[("maxResults", max_results.as_str()), ("q", "is:unread")])
            .send()
            .await?
            .json_checked()
            .await?;

        if list.messages.is_empty() {
            info!("No unread messages found");
            return Ok(Vec::new());
        }

        // Snippets are only available per message.
        let mut summaries = Vec::with_capacity(list.messages.len());
        for message in list.messages.iter().take(quantity) {
            summaries.push(self.get(&message.id).await?);
        }
        Ok(summaries)
    }

    async fn get(&self, id: &str) -> Result<MailSummary, MailError> {
        let summary = self
            .request(Method::GET, &format!("messages/{}", id))?
            .query(&[("format", "minimal")])
            .send()
            .await?
            .json_checked()
            .await?;
        Ok(summary)
    }

    async fn batch_delete(&self, ids: &[String]) -> Result<(), MailError> {
        self.request(Method::POST, "messages/batchDelete")?
            .json_logged(&BatchDeleteRequest { ids })
            .send()
            .await?
            .empty_checked()
            .await?;
        info!("Deleted {} messages", ids.len());
        Ok(())
    }

    async fn batch_mark_read(&self, ids: &[String]) -> Result<(), MailError> {
        self.request(Method::POST, "messages/batchModify")?
            .json_logged(&BatchModifyRequest {
                ids,
                remove_label_ids: &[UNREAD_LABEL],
            })
            .send()
            .await?
            .empty_checked()
            .await?;
        info!("Marked {} messages as read", ids.len());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Serialize)]
struct BatchDeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchModifyRequest<'a> {
    ids: &'a [String],
    remove_label_ids: &'a [&'a str],
}
