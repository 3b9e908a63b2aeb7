//! Environment-driven configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::providers::{OLLAMA_DEFAULT_MODEL, OLLAMA_DEFAULT_URL, OPENAI_DEFAULT_URL};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Assistant used by `spam-filter`; created on the fly when unset.
    pub assistant_id: Option<String>,
    /// Assistant used by `clean-inbox`.
    pub spam_filter_assistant_id: Option<String>,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub gmail_credentials_path: PathBuf,
    pub gmail_token_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_DEFAULT_URL.to_string()),
            assistant_id: get("OPENAI_ASSISTANT_ID"),
            spam_filter_assistant_id: get("OPENAI_SPAM_FILTER_ASSISTANT_ID"),
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string()),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string()),
            gmail_credentials_path: get("GMAIL_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("credentials.json")),
            gmail_token_path: get("GMAIL_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("token.json")),
        }
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    pub fn require_spam_filter_assistant(&self) -> Result<&str, ConfigError> {
        self.spam_filter_assistant_id
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_SPAM_FILTER_ASSISTANT_ID"))
    }
}

/// Number of unread messages handed to the model per sweep.
///
/// Parsed from `deleteCount=N` or a bare `N`. Defaults to 2; capped at 3
/// because larger batches overflow the model's function-call output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub const DEFAULT: usize = 2;
    pub const MAX: usize = 3;

    pub fn new(requested: usize) -> Self {
        match requested {
            0 => BatchSize(Self::DEFAULT),
            n => BatchSize(n.min(Self::MAX)),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize(Self::DEFAULT)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let value = match raw.split_once('=') {
            Some((key, value)) if key.trim() == "deleteCount" => value.trim(),
            Some((key, _)) => {
                return Err(ConfigError::Invalid {
                    name: "deleteCount",
                    reason: format!("unknown argument {}", key.trim()),
                })
            }
            None => raw,
        };

        let requested = value.parse::<usize>().map_err(|e| ConfigError::Invalid {
            name: "deleteCount",
            reason: format!("{:?}: {}", value, e),
        })?;
        Ok(BatchSize::new(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.openai_base_url, OPENAI_DEFAULT_URL);
        assert_eq!(config.ollama_model, OLLAMA_DEFAULT_MODEL);
        assert_eq!(config.gmail_token_path, PathBuf::from("token.json"));
        assert_eq!(
            config.require_spam_filter_assistant(),
            Err(ConfigError::Missing("OPENAI_SPAM_FILTER_ASSISTANT_ID"))
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]));
        assert_eq!(
            config.require_api_key(),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        );
    }

    #[test]
    fn set_values_are_used() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_SPAM_FILTER_ASSISTANT_ID", "asst_1"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
        ]));
        assert_eq!(config.require_api_key(), Ok("sk-test"));
        assert_eq!(config.require_spam_filter_assistant(), Ok("asst_1"));
        assert_eq!(config.ollama_base_url, "http://gpu-box:11434");
    }

    #[test]
    fn batch_size_parses_defaults_and_clamps() {
        assert_eq!(BatchSize::default().get(), 2);
        assert_eq!("deleteCount=1".parse::<BatchSize>().unwrap().get(), 1);
        assert_eq!("deleteCount=10".parse::<BatchSize>().unwrap().get(), 3);
        assert_eq!("deleteCount=0".parse::<BatchSize>().unwrap().get(), 2);
        assert_eq!("3".parse::<BatchSize>().unwrap().get(), 3);
    }

    #[test]
    fn batch_size_rejects_garbage() {
        assert!("deleteCount=lots".parse::<BatchSize>().is_err());
        assert!("count=2".parse::<BatchSize>().is_err());
    }
}
