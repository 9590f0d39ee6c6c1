use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::CompletionError;

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where and how to ask for completions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full endpoint URL, e.g. `https://api.openai.com/v1/chat/completions`.
    pub api_url: String,
    /// Bearer token. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Wire shape: `"openai"` (chat messages) or `"custom"` (plain prompt).
    pub provider: String,
    pub model: String,
    /// Total attempts per call, counting the first.
    pub max_retries: u32,
    /// Wait between rate-limited attempts.
    #[serde(with = "crate::serde_millis")]
    pub rate_limit_backoff: Duration,
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: None,
            provider: "openai".into(),
            model: "gpt-3.5-turbo".into(),
            max_retries: 5,
            rate_limit_backoff: Duration::from_secs(60),
            timeout_secs: Some(60),
        }
    }
}

impl CompletionConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Configured key, or `OPENAI_API_KEY` from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.api_url.trim().is_empty() {
            return Err(CompletionError::InvalidConfig("api_url cannot be empty".into()));
        }

        let valid_providers = ["openai", "custom"];
        if !valid_providers.contains(&self.provider.as_str()) {
            return Err(CompletionError::InvalidConfig(format!(
                "provider must be one of: {valid_providers:?}"
            )));
        }

        if self.model.trim().is_empty() {
            return Err(CompletionError::InvalidConfig("model cannot be empty".into()));
        }

        if self.max_retries == 0 {
            return Err(CompletionError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(CompletionError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
