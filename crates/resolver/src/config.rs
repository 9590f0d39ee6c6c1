use serde::{Deserialize, Serialize};

use crate::ResolveError;

/// Tuning for one resolver context.
///
/// `model` and `max_retries` are not read from config files; the umbrella crate
/// copies them from the completion section so the two never disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Candidates offered to stage 2 when the caller does not say.
    pub top_k: usize,
    #[serde(skip)]
    pub max_retries: u32,
    #[serde(skip)]
    pub model: String,
    /// Reject a stage-2 metric that is not among the ranked candidates.
    pub strict_candidates: bool,
    /// Accepted and echoed back; not applied to the ranking.
    pub relevance_threshold: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_retries: 5,
            model: "gpt-3.5-turbo".into(),
            strict_candidates: false,
            relevance_threshold: 0.0,
        }
    }
}

impl ResolverConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_strict_candidates(mut self, strict: bool) -> Self {
        self.strict_candidates = strict;
        self
    }

    pub fn with_completion(mut self, model: impl Into<String>, max_retries: u32) -> Self {
        self.model = model.into();
        self.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.top_k == 0 {
            return Err(ResolveError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(ResolveError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("model cannot be empty".into()));
        }
        if !self.relevance_threshold.is_finite() {
            return Err(ResolveError::InvalidConfig(
                "relevance_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}
