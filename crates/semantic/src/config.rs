use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::SemanticError;

const MINILM_BASE_URL: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Runtime configuration describing which embedding model to run and how to
/// post-process its vectors.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Inference mode selector: `"onnx"` (local model), `"api"` (remote HTTP),
    /// or `"fast"` (deterministic stub).
    pub mode: String,
    /// Stub dimension selector: `"fast"` = 384, `"balanced"` = 768, `"accurate"` = 1024.
    /// Ignored by real models, where the model decides.
    pub tier: String,
    /// Model name; sent to providers that route by model (OpenAI).
    pub model_name: String,
    /// Local path of the ONNX file, also the download target for
    /// [`model_url`](Self::model_url).
    pub model_path: PathBuf,
    /// Fetched when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent the file is placed next to the model.
    pub tokenizer_path: Option<PathBuf>,
    /// Fetched when the tokenizer file is missing.
    pub tokenizer_url: Option<String>,
    /// Token limit per text; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Embedding endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Max texts per model call when encoding the catalog.
    pub batch_size: usize,
    /// Normalize vectors to unit length.
    pub normalize: bool,
    /// Must be set to run `"fast"` mode. Stub vectors carry no meaning, so a
    /// catalog indexed with them ranks candidates arbitrarily.
    pub allow_stub: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            tier: "fast".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            model_url: Some(format!("{MINILM_BASE_URL}/onnx/model.onnx")),
            tokenizer_path: Some(PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json")),
            tokenizer_url: Some(format!("{MINILM_BASE_URL}/tokenizer.json")),
            max_sequence_length: 256,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            batch_size: 32,
            normalize: true,
            allow_stub: false,
        }
    }
}

impl SemanticConfig {
    /// Deterministic hash embeddings for tests and offline runs.
    pub fn stub() -> Self {
        Self {
            mode: "fast".into(),
            allow_stub: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SemanticError> {
        let valid_modes = ["onnx", "api", "fast"];
        if !valid_modes.contains(&self.mode.as_str()) {
            return Err(SemanticError::InvalidConfig(format!(
                "mode must be one of: {valid_modes:?}"
            )));
        }

        if self.mode == "fast" && !self.allow_stub {
            return Err(SemanticError::InvalidConfig(
                "fast mode produces hash vectors with no semantic similarity; \
                 set allow_stub to use it"
                    .into(),
            ));
        }

        if self.mode == "onnx" && !cfg!(feature = "onnx") {
            return Err(SemanticError::InvalidConfig(
                "onnx mode requires the `onnx` feature".into(),
            ));
        }

        let valid_tiers = ["fast", "balanced", "accurate"];
        if !valid_tiers.contains(&self.tier.as_str()) {
            return Err(SemanticError::InvalidConfig(format!(
                "tier must be one of: {valid_tiers:?}"
            )));
        }

        if self.mode == "api" && self.api_url.as_deref().is_none_or(str::is_empty) {
            return Err(SemanticError::InvalidConfig(
                "api_url is required for api mode".into(),
            ));
        }

        if self.mode == "onnx" {
            if self.model_path.as_os_str().is_empty() {
                return Err(SemanticError::InvalidConfig(
                    "model_path is required for onnx mode".into(),
                ));
            }
            if self.tokenizer_path.is_none() && self.tokenizer_url.is_none() {
                return Err(SemanticError::InvalidConfig(
                    "onnx mode needs tokenizer_path or tokenizer_url".into(),
                ));
            }
            if self.max_sequence_length == 0 {
                return Err(SemanticError::InvalidConfig(
                    "max_sequence_length must be >= 1".into(),
                ));
            }
        }

        if self.batch_size == 0 {
            return Err(SemanticError::InvalidConfig(
                "batch_size must be >= 1".into(),
            ));
        }

        Ok(())
    }
}
