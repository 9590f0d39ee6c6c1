use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness: 200 while the process is serving.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "metriq-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness, with the size of the loaded catalog index.
///
/// The index is built before the listener binds, so reaching this handler
/// means it is ready.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let resolver = state.pipeline.resolver();
    let index = resolver.index();

    Ok(Json(json!({
        "status": "ready",
        "service": "metriq-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "components": {
            "catalog": {
                "url": state.pipeline.catalog().base_url().as_str(),
                "metrics": index.len(),
            },
            "embeddings": {
                "dimension": index.dim(),
            },
            "resolver": {
                "model": resolver.config().model,
                "top_k": resolver.config().top_k,
                "strict_candidates": resolver.config().strict_candidates,
            }
        }
    })))
}
