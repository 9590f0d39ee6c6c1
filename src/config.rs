//! YAML configuration for the metriq pipeline.
//!
//! One file describes the catalog location, the embedding model, the completion
//! service and the resolver tuning. Every section is optional and falls back to
//! its defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "staging"
//!
//! catalog:
//!   url: "http://dj:8000"
//!   timeout_secs: 30
//!
//! # Local all-MiniLM-L6-v2 through ONNX Runtime is the default; a remote
//! # endpoint can be used instead.
//! semantic:
//!   mode: "api"
//!   api_provider: "hf"
//!   api_url: "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction"
//!   api_auth_header: "Bearer hf_xxx"
//!
//! completion:
//!   api_url: "https://api.openai.com/v1/chat/completions"
//!   model: "gpt-3.5-turbo"
//!   max_retries: 5
//!   rate_limit_backoff: 60000
//!
//! resolver:
//!   top_k: 5
//!   strict_candidates: false
//! ```
//!
//! `DJ_URL` overrides `catalog.url`; `OPENAI_API_KEY` supplies the completion
//! key when the file does not.

use std::fs;
use std::path::Path;

use catalog::Url;
use completion::CompletionConfig;
use resolver::ResolverConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides `catalog.url`.
pub const CATALOG_URL_ENV: &str = "DJ_URL";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetriqConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub catalog: CatalogYamlConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl MetriqConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: MetriqConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `DJ_URL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup, empty values ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(CATALOG_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.catalog.url = url;
        }
        self
    }

    /// Resolver settings with the completion model and attempt budget filled in.
    pub fn resolver_config(&self) -> ResolverConfig {
        self.resolver
            .clone()
            .with_completion(self.completion.model.clone(), self.completion.max_retries)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.catalog.validate()?;
        self.semantic
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("semantic: {e}")))?;
        self.completion
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("completion: {e}")))?;
        self.resolver_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("resolver: {e}")))?;

        Ok(())
    }
}

impl Default for MetriqConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            catalog: CatalogYamlConfig::default(),
            semantic: SemanticConfig::default(),
            completion: CompletionConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Where the metrics catalog lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogYamlConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl CatalogYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let url = Url::parse(&self.url).map_err(|e| {
            ConfigLoadError::Validation(format!("catalog.url '{}' is invalid: {e}", self.url))
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigLoadError::Validation(format!(
                "catalog.url '{}' cannot be used as a base URL",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "catalog.timeout_secs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CatalogYamlConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_catalog_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
catalog:
  url: "http://dj:8000"
resolver:
  top_k: 8
"#;

        let config = MetriqConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("test config"));
        assert_eq!(config.catalog.url, "http://dj:8000");
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.resolver.top_k, 8);
        assert_eq!(config.semantic.mode, "onnx");
    }

    #[test]
    fn default_pipeline_does_not_use_stub_embeddings() {
        let config = MetriqConfig::default();
        assert_eq!(config.semantic.mode, "onnx");
        assert_eq!(config.semantic.model_name, "all-MiniLM-L6-v2");
        assert!(!config.semantic.allow_stub);
    }

    #[test]
    fn stub_embeddings_need_explicit_opt_in() {
        let err = MetriqConfig::from_yaml("version: \"1.0\"\nsemantic:\n  mode: fast\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(ref msg) if msg.contains("allow_stub")));

        let config =
            MetriqConfig::from_yaml("version: \"1.0\"\nsemantic:\n  mode: fast\n  allow_stub: true\n")
                .unwrap();
        assert_eq!(config.semantic.mode, "fast");
    }

    #[test]
    fn load_from_file() {
        let yaml = "version: \"1.0\"\ncompletion:\n  model: gpt-4o-mini\n";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = MetriqConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.completion.model, "gpt-4o-mini");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = MetriqConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn default_config_is_valid() {
        let config = MetriqConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unsupported_version_rejected() {
        let err = MetriqConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn section_validation_surfaces() {
        let err = MetriqConfig::from_yaml("version: \"1.0\"\nsemantic:\n  tier: huge\n").unwrap_err();
        assert!(err.to_string().contains("semantic"));

        let err = MetriqConfig::from_yaml("version: \"1.0\"\ncompletion:\n  max_retries: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_retries"));

        let err = MetriqConfig::from_yaml("version: \"1.0\"\ncatalog:\n  url: \"not a url\"\n").unwrap_err();
        assert!(err.to_string().contains("catalog.url"));
    }

    #[test]
    fn resolver_takes_completion_model_and_budget() {
        let yaml = r#"
version: "1.0"
completion:
  model: "gpt-4o-mini"
  max_retries: 2
  rate_limit_backoff: 1500
"#;
        let config = MetriqConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.completion.rate_limit_backoff, Duration::from_millis(1500));

        let resolver = config.resolver_config();
        assert_eq!(resolver.model, "gpt-4o-mini");
        assert_eq!(resolver.max_retries, 2);
    }

    #[test]
    fn catalog_url_override() {
        let config = MetriqConfig::default().with_overrides_from(|key| {
            (key == CATALOG_URL_ENV).then(|| "http://override:9000".to_string())
        });
        assert_eq!(config.catalog.url, "http://override:9000");

        let config = MetriqConfig::default().with_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(config.catalog.url, "http://localhost:8000");
    }
}
