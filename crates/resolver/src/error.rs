use std::fmt;

use completion::CompletionError;
use semantic::SemanticError;
use serde::Serialize;
use thiserror::Error;

/// Which completion round produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStage {
    /// Stage 1: pull the metric phrase out of the question.
    Extraction,
    /// Stage 2: pick one metric plus its group-bys and filters.
    Shaping,
}

impl fmt::Display for PromptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction => f.write_str("extraction"),
            Self::Shaping => f.write_str("shaping"),
        }
    }
}

/// Per-question failures. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("completion service still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("malformed {stage} reply: {reason}")]
    MalformedCompletionResponse { stage: PromptStage, reason: String },

    #[error("no metric was selected")]
    EmptyMetricSelection,

    #[error("selected metric '{0}' is not one of the ranked candidates")]
    UnknownMetricSelection(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] SemanticError),

    #[error("catalog has {entries} entries but the embedding table has {rows} rows")]
    IndexMismatch { entries: usize, rows: usize },

    #[error("invalid resolver config: {0}")]
    InvalidConfig(String),
}

impl From<CompletionError> for ResolveError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::RetriesExhausted { attempts } => Self::RateLimitExhausted { attempts },
            CompletionError::RateLimited => Self::RateLimitExhausted { attempts: 1 },
            CompletionError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            other @ (CompletionError::Service(_) | CompletionError::InvalidResponse(_)) => {
                Self::ServiceUnavailable(other.to_string())
            }
        }
    }
}
