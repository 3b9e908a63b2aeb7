//! One-shot spam classification with a local model.

use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;
use tracing::{debug, warn};

use crate::api::ollama::OllamaClient;
use crate::client::ClientError;
use crate::handlers::sweep::ClassifiedMessage;
use crate::mail::MailSummary;

/// Parsed model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Verdicts(Vec<ClassifiedMessage>),
    /// The model answered, but not in the expected shape.
    Malformed(String),
}

/// Built-in emails for trying the classifier without a mailbox.
pub fn sample_emails() -> Vec<MailSummary> {
    [
        ("1", "buy bitcoin now"),
        (
            "2",
            "Hello Fer, just confirming our next meeting is at 3pm on 12/12/2022",
        ),
        ("3", "Get this deal! You are going to get rich soon!"),
    ]
    .into_iter()
    .map(|(id, snippet)| MailSummary {
        id: id.to_string(),
        snippet: snippet.to_string(),
    })
    .collect()
}

/// Prompt asking for a JSON verdict per email.
pub fn spam_prompt(emails: &[MailSummary]) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant that filters spam emails.\nFrom the following list of emails:\n",
    );
    for email in emails {
        let _ = writeln!(prompt, "- id: {}, snippet: {}.", email.id, email.snippet);
    }
    prompt.push_str(
        r#"Tell whether the email is spam or not and why.
Return your response in JSON in the following JSON format:

  {
    "messages": [
      {
        "id": The id of the message,
        "snippet": The snippet of the message,
        "is_spam_or_marketing": true/false,
        "reason": A comprehensive description of the reason why the message is spam
      }
    ]
  }
"#,
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct VerdictList {
    messages: Vec<ClassifiedMessage>,
}

/// Interpret the model's text.
///
/// Never fails: anything that is not `{"messages": [...]}` with the expected
/// fields becomes [`Classification::Malformed`] with a description.
pub fn parse_verdicts(text: &str) -> Classification {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(e) => {
            return Classification::Malformed(format!("model output is not JSON ({}): {}", e, text))
        }
    };

    if value.get("messages").is_none() {
        return Classification::Malformed(format!(
            "model output has no \"messages\" field: {}",
            value
        ));
    }

    match serde_json::from_value::<VerdictList>(value) {
        Ok(list) => Classification::Verdicts(list.messages),
        Err(e) => Classification::Malformed(format!("model output has the wrong shape: {}", e)),
    }
}

/// Classify `emails` with the local model.
///
/// Transport and API failures are errors; a bad answer is a [`Classification::Malformed`].
pub async fn classify(
    client: &OllamaClient,
    emails: &[MailSummary],
) -> Result<Classification, ClientError> {
    let prompt = spam_prompt(emails);
    debug!("Classifying {} emails", emails.len());

    let response = client.generate(&prompt, true).await?;
    let classification = parse_verdicts(&response.response);
    if let Classification::Malformed(reason) = &classification {
        warn!("Local model returned unusable output: {}", reason);
    }
    Ok(classification)
}
