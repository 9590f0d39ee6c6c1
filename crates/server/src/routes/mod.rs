//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `query`: natural-language metric questions

pub mod health;
pub mod query;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Service name, version and endpoint list (`GET /`).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "metriq",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/query/{question}?n=<top_k>&rel=<threshold>",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
