use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog::CatalogError;
use metriq::PipelineError;
use resolver::ResolveError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Not found")]
    NotFound,
}

/// Body of every failed request: `{"error": {"code", "message"}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Resolve(e) => ServerError::Resolve(e),
            PipelineError::Catalog(e) => ServerError::Catalog(e),
        }
    }
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Resolve(e) => match e {
                ResolveError::RateLimitExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
                ResolveError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ResolveError::MalformedCompletionResponse { .. } => StatusCode::BAD_GATEWAY,
                ResolveError::EmptyMetricSelection | ResolveError::UnknownMetricSelection(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ResolveError::Embedding(_) => StatusCode::BAD_GATEWAY,
                ResolveError::IndexMismatch { .. } | ResolveError::InvalidConfig(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::Catalog(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Resolve(e) => match e {
                ResolveError::RateLimitExhausted { .. } => "RATE_LIMIT_EXHAUSTED",
                ResolveError::ServiceUnavailable(_) => "COMPLETION_UNAVAILABLE",
                ResolveError::MalformedCompletionResponse { .. } => "MALFORMED_COMPLETION",
                ResolveError::EmptyMetricSelection => "EMPTY_METRIC_SELECTION",
                ResolveError::UnknownMetricSelection(_) => "UNKNOWN_METRIC_SELECTION",
                ResolveError::Embedding(_) => "EMBEDDING_ERROR",
                ResolveError::IndexMismatch { .. } => "INDEX_ERROR",
                ResolveError::InvalidConfig(_) => "CONFIG_ERROR",
            },
            ServerError::Catalog(_) => "CATALOG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        if status.is_server_error() {
            tracing::error!(code = %body.error.code, message = %body.error.message, "request failed");
        } else {
            tracing::warn!(code = %body.error.code, message = %body.error.message, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
