use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::{SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    pub(crate) fn from_config(cfg: &SemanticConfig) -> Self {
        let provider = cfg
            .api_provider
            .as_deref()
            .unwrap_or("custom")
            .to_ascii_lowercase();
        match provider.as_str() {
            "hf" | "huggingface" => Self::HuggingFace,
            "openai" | "gpt" => Self::OpenAI,
            _ => Self::Custom,
        }
    }
}

/// Remote embedding endpoint bound to one HTTP client.
///
/// The client is owned here rather than kept in a process global, so tests and
/// multiple configurations can coexist.
#[derive(Debug, Clone)]
pub(crate) struct ApiBackend {
    http: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
}

impl ApiBackend {
    pub(crate) fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(8);
        if let Some(secs) = cfg.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            http,
            url,
            auth_header: cfg.api_auth_header.clone(),
            provider: ApiProviderKind::from_config(cfg),
            model_name: cfg.model_name.clone(),
        })
    }

    /// Encode a batch in a single request. The response must carry exactly one
    /// vector per input.
    pub(crate) async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let payload = build_api_payload(self.provider, texts, &self.model_name);
        let response = self.send(payload).await?;
        let vectors = parse_embeddings_from_value(response)?;

        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "API returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        debug!(count = vectors.len(), "embedding batch received");
        Ok(vectors)
    }

    async fn send(&self, payload: Value) -> Result<Value, SemanticError> {
        let mut request = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| SemanticError::Request(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Request(format!(
                "HTTP error {status}: {body}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Inference(format!("Invalid JSON response: {e}")))
    }
}

/// Request body per provider. Batches always go out as arrays, so a
/// one-element batch still gets a one-element array back.
pub(crate) fn build_api_payload(provider: ApiProviderKind, texts: &[&str], model: &str) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAI => json!({ "input": texts, "model": model }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

pub(crate) fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
