use std::io;
use thiserror::Error;

/// Errors surfaced while encoding text or searching the embedding table.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g., api mode without an `api_url`).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The ONNX model is not on disk and no download URL was configured.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Unable to download remote model assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Filesystem failure while storing or reading model assets.
    #[error("io error: {0}")]
    Io(String),
    /// The embedding endpoint could not be reached or answered with an error status.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The model answered, but not with something we can turn into vectors.
    #[error("inference failure: {0}")]
    Inference(String),
    /// A vector does not match the dimension of the table it is compared against.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<io::Error> for SemanticError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = SemanticError::InvalidConfig("missing api_url".into());
        assert!(err.to_string().contains("invalid semantic config"));
        assert!(err.to_string().contains("missing api_url"));
    }

    #[test]
    fn error_request() {
        let err = SemanticError::Request("HTTP error 503".into());
        assert!(err.to_string().contains("embedding request failed"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn error_inference() {
        let err = SemanticError::Inference("unsupported API response shape".into());
        assert!(err.to_string().contains("inference failure"));
    }

    #[test]
    fn error_dimension_mismatch() {
        let err = SemanticError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("384"));
        assert!(msg.contains("768"));
    }

    #[test]
    fn error_model_not_found() {
        let err = SemanticError::ModelNotFound("./models/model.onnx".into());
        assert!(err.to_string().contains("model file not found"));
        assert!(err.to_string().contains("./models/model.onnx"));
    }

    #[test]
    fn error_from_io_keeps_message() {
        let err: SemanticError = io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into();
        assert_eq!(err, SemanticError::Io("read-only".into()));
    }

    #[test]
    fn error_clone_eq() {
        let err = SemanticError::Inference("e".into());
        assert_eq!(err.clone(), err);
    }
}
