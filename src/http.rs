//! HTTP helpers shared by the assistant, local model and mailbox clients.

use reqwest::{Client, RequestBuilder, StatusCode};

use crate::options::TransportOptions;

/// reqwest client honouring the transport timeout.
pub fn build_http_client(transport: &TransportOptions) -> Result<Client, reqwest::Error> {
    let builder = Client::builder();
    let builder = match transport.timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    };
    builder.build()
}

/// Attach the transport's extra headers to `request`.
pub fn add_extra_headers(request: RequestBuilder, transport: &TransportOptions) -> RequestBuilder {
    transport
        .headers
        .iter()
        .fold(request, |request, (name, value)| request.header(name, value))
}

pub trait RequestBuilderExt {
    /// `json()` that also logs the body at debug level.
    fn json_logged<T: serde::Serialize + ?Sized>(self, body: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(text) => tracing::debug!(bytes = text.len(), "request body: {}", text),
            Err(e) => tracing::debug!("request body not loggable: {}", e),
        }
        self.json(body)
    }
}

/// Failure while sending a request or reading its response.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Pull a readable message out of an error body.
///
/// Understands `{"error": {"message": ..}}` and `{"error": ".."}`; anything
/// else is returned as-is.
pub fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| match v.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(obj) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        None => None,
    });
    message.unwrap_or_else(|| body.to_string())
}

/// Extension trait for Response that logs response bodies.
#[async_trait::async_trait]
pub trait ResponseExt: Sized {
    /// Get response text and log it. Consumes the response.
    async fn text_logged(self) -> Result<String, reqwest::Error>;

    /// Read and log the body, fail on non-success statuses, then parse it as JSON.
    async fn json_checked<T: serde::de::DeserializeOwned>(self) -> Result<T, ResponseError>;

    /// Like [`ResponseExt::json_checked`] for endpoints that answer with an empty body.
    async fn empty_checked(self) -> Result<(), ResponseError>;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn text_logged(self) -> Result<String, reqwest::Error> {
        let text = self.text().await?;
        tracing::debug!("API response ({} bytes):\n{}", text.len(), text);
        Ok(text)
    }

    async fn json_checked<T: serde::de::DeserializeOwned>(self) -> Result<T, ResponseError> {
        let status = self.status();
        let text = self.text_logged().await?;

        if !status.is_success() {
            return Err(ResponseError::Status {
                status,
                message: error_message(&text),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn empty_checked(self) -> Result<(), ResponseError> {
        let status = self.status();
        let text = self.text_logged().await?;

        if !status.is_success() {
            return Err(ResponseError::Status {
                status,
                message: error_message(&text),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::error_message;

    #[test]
    fn error_message_reads_nested_and_flat_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"No thread found","type":"invalid_request_error"}}"#),
            "No thread found"
        );
        assert_eq!(error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
