use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::retry::RetryPolicy;
use crate::{CompletionConfig, CompletionError};

/// One attempt at turning a prompt into text.
///
/// Implementations report the rate-limit signal as
/// [`CompletionError::RateLimited`]; retrying is the caller's job.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete_once(&self, prompt: &str, model: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    /// `{model, temperature, messages}` -> `choices[0].message.content`
    Chat,
    /// `{model, temperature, prompt}` -> `choices[0].text`
    Plain,
}

impl WireFormat {
    fn from_provider(provider: &str) -> Self {
        match provider.to_ascii_lowercase().as_str() {
            "custom" => Self::Plain,
            _ => Self::Chat,
        }
    }
}

/// Completion service over HTTP, OpenAI-compatible.
#[derive(Debug, Clone)]
pub struct HttpCompletionService {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    format: WireFormat,
}

impl HttpCompletionService {
    pub fn new(cfg: &CompletionConfig) -> Result<Self, CompletionError> {
        cfg.validate()?;

        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| CompletionError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            url: cfg.api_url.clone(),
            api_key: cfg.resolve_api_key(),
            format: WireFormat::from_provider(&cfg.provider),
        })
    }

    fn payload(&self, prompt: &str, model: &str) -> Value {
        match self.format {
            WireFormat::Chat => json!({
                "model": model,
                "temperature": 0,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            WireFormat::Plain => json!({
                "model": model,
                "temperature": 0,
                "prompt": prompt,
            }),
        }
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete_once(&self, prompt: &str, model: &str) -> Result<String, CompletionError> {
        let mut request = self.http.post(&self.url).json(&self.payload(prompt, model));
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Service(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Service(format!(
                "HTTP error {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(format!("invalid JSON: {e}")))?;
        extract_choice_text(&body, self.format)
    }
}

fn extract_choice_text(body: &Value, format: WireFormat) -> Result<String, CompletionError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".into()))?;

    let text = match format {
        WireFormat::Chat => choice.pointer("/message/content"),
        WireFormat::Plain => choice.get("text"),
    };

    text.and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CompletionError::InvalidResponse("first choice carries no text".into()))
}

/// Retrying front door over any [`CompletionService`].
#[derive(Clone)]
pub struct CompletionClient {
    service: Arc<dyn CompletionService>,
    backoff: Duration,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    pub fn new(service: Arc<dyn CompletionService>, backoff: Duration) -> Self {
        Self { service, backoff }
    }

    /// HTTP-backed client built from configuration.
    pub fn from_config(cfg: &CompletionConfig) -> Result<Self, CompletionError> {
        let service = HttpCompletionService::new(cfg)?;
        Ok(Self::new(Arc::new(service), cfg.rate_limit_backoff))
    }

    /// Sends `prompt` at temperature 0 and returns the first choice's text.
    ///
    /// Makes at most `max_retries` attempts in total (0 is treated as 1),
    /// sleeping the configured backoff after each rate-limited one.
    pub async fn complete(
        &self,
        prompt: &str,
        max_retries: u32,
        model: &str,
    ) -> Result<String, CompletionError> {
        let policy = RetryPolicy::new(max_retries, self.backoff);
        let text = policy
            .run(|attempt| {
                debug!(attempt, model, "requesting completion");
                self.service.complete_once(prompt, model)
            })
            .await?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}
