use thiserror::Error;

/// Failures of a single completion call or of a whole retried call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("invalid completion config: {0}")]
    InvalidConfig(String),
    /// The service answered with its rate-limit signal (HTTP 429).
    #[error("completion service rate limited the request")]
    RateLimited,
    /// Any other transport or status failure. Never retried.
    #[error("completion service unavailable: {0}")]
    Service(String),
    /// The service answered 2xx but the body had no usable choice.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
    /// Every attempt was rate limited.
    #[error("completion still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert!(CompletionError::RateLimited.to_string().contains("rate limited"));
        assert!(CompletionError::Service("HTTP error 500".into())
            .to_string()
            .contains("500"));
        assert_eq!(
            CompletionError::RetriesExhausted { attempts: 5 }.to_string(),
            "completion still rate limited after 5 attempts"
        );
    }

    #[test]
    fn only_rate_limited_is_rate_limited() {
        assert!(CompletionError::RateLimited.is_rate_limited());
        assert!(!CompletionError::Service("x".into()).is_rate_limited());
        assert!(!CompletionError::RetriesExhausted { attempts: 1 }.is_rate_limited());
    }
}
