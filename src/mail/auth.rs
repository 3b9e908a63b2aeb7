//! OAuth for the mailbox: persisted refresh token, refresh, one-time consent.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::MailError;
use crate::console::Console;
use crate::http::{build_http_client, ResponseExt};
use crate::options::TransportOptions;

/// Full mailbox access; needed for permanent deletion.
pub const MAIL_SCOPE: &str = "https://mail.google.com/";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration, as downloaded from the provider console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ClientSecrets {
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// Credential blob persisted after the first consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl AuthorizedUser {
    pub fn new(secrets: &ClientSecrets, refresh_token: String) -> Self {
        Self {
            kind: "authorized_user".to_string(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            refresh_token,
            token_uri: secrets.token_uri.clone(),
        }
    }
}

/// Locations of the client registration and the saved credential blob.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Read the saved credential blob.
    ///
    /// A missing or unreadable blob yields `None` so the caller falls back to consent.
    pub async fn load_saved(&self) -> Option<AuthorizedUser> {
        let content = match tokio::fs::read(&self.token_path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No saved credentials at {}: {}", self.token_path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice(&content) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(
                    "Ignoring malformed credentials at {}: {}",
                    self.token_path.display(),
                    e
                );
                None
            }
        }
    }

    pub async fn save(&self, user: &AuthorizedUser) -> Result<(), MailError> {
        let payload = serde_json::to_vec_pretty(user)?;
        tokio::fs::write(&self.token_path, payload).await?;
        info!("Saved credentials to {}", self.token_path.display());
        Ok(())
    }

    /// Read the client registration (`installed` or `web` section).
    pub async fn load_client_secrets(&self) -> Result<ClientSecrets, MailError> {
        let content = tokio::fs::read(&self.credentials_path).await.map_err(|e| {
            MailError::Auth(format!(
                "cannot read client credentials {}: {}",
                self.credentials_path.display(),
                e
            ))
        })?;
        let file: SecretsFile = serde_json::from_slice(&content)?;
        file.installed.or(file.web).ok_or_else(|| {
            MailError::Auth(format!(
                "{} has neither an 'installed' nor a 'web' section",
                self.credentials_path.display()
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Token endpoint calls.
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    transport_options: TransportOptions,
}

impl OAuthClient {
    pub fn new(transport_options: TransportOptions) -> Self {
        Self { transport_options }
    }

    /// URL the user opens to grant access.
    pub fn consent_url(&self, secrets: &ClientSecrets) -> Result<Url, MailError> {
        Url::parse_with_params(
            &secrets.auth_uri,
            &[
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", secrets.redirect_uri()),
                ("response_type", "code"),
                ("scope", MAIL_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| MailError::Auth(format!("invalid auth_uri {}: {}", secrets.auth_uri, e)))
    }

    /// Trade an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
    ) -> Result<TokenResponse, MailError> {
        self.token_request(
            &secrets.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", secrets.redirect_uri()),
            ],
        )
        .await
    }

    /// Get a fresh access token for a saved credential blob.
    pub async fn refresh(&self, user: &AuthorizedUser) -> Result<TokenResponse, MailError> {
        self.token_request(
            &user.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", user.refresh_token.as_str()),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
            ],
        )
        .await
    }

    async fn token_request(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, MailError> {
        debug!("POST {}", token_uri);
        let http_client = build_http_client(&self.transport_options)?;
        let response = http_client
            .post(token_uri)
            .form(form)
            .send()
            .await?
            .json_checked()
            .await
            .map_err(|e| MailError::Auth(format!("token request failed: {}", e)))?;
        Ok(response)
    }
}

/// Accept either the bare code or the whole redirected URL.
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Load or obtain mailbox authorization and return an access token.
///
/// Uses the saved credential blob when present; otherwise runs the one-time
/// interactive consent through `console` and persists the result.
pub async fn authorize(
    store: &CredentialStore,
    oauth: &OAuthClient,
    console: &dyn Console,
) -> Result<String, MailError> {
    if let Some(user) = store.load_saved().await {
        debug!("Refreshing saved credentials");
        let token = oauth.refresh(&user).await?;
        return Ok(token.access_token);
    }

    let secrets = store.load_client_secrets().await?;
    let url = oauth.consent_url(&secrets)?;
    console
        .say(&format!("Authorize mailbox access by visiting:\n\n  {}\n", url))
        .await?;
    let answer = console
        .ask("Paste the redirected URL (or just its code): ")
        .await?;
    let code = extract_code(&answer)
        .ok_or_else(|| MailError::Auth("no authorization code given".to_string()))?;

    let token = oauth.exchange_code(&secrets, &code).await?;
    match &token.refresh_token {
        Some(refresh_token) => {
            store
                .save(&AuthorizedUser::new(&secrets, refresh_token.clone()))
                .await?
        }
        None => warn!("Consent returned no refresh token; credentials not saved"),
    }
    Ok(token.access_token)
}
