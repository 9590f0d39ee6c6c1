use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// `?n=<top_k>&rel=<threshold>`
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    /// Candidates offered to the model; defaults to the resolver's `top_k`.
    pub n: Option<usize>,
    /// Accepted and echoed back, not applied.
    pub rel: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub metric: String,
    pub dimensions: String,
    pub filters: String,
    pub relevance_threshold: f32,
    pub candidates: Vec<CandidateSummary>,
    /// Catalog response for the assembled query, verbatim.
    pub data: Value,
}

/// `GET /query/{question}`: resolve the question and return the metric data.
pub async fn query_metric(
    State(state): State<Arc<ServerState>>,
    Path(question): Path<String>,
    Query(params): Query<QueryParams>,
) -> ServerResult<impl IntoResponse> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ServerError::BadRequest("question cannot be empty".into()));
    }
    if params.n == Some(0) {
        return Err(ServerError::BadRequest("n must be at least 1".into()));
    }
    let relevance_threshold = params
        .rel
        .unwrap_or(state.pipeline.resolver().config().relevance_threshold);
    if !relevance_threshold.is_finite() {
        return Err(ServerError::BadRequest("rel must be a finite number".into()));
    }

    let answer = state.pipeline.query(question, params.n).await?;
    let resolution = answer.resolution;

    Ok(Json(QueryResponse {
        question: resolution.question,
        metric: resolution.descriptor.metric,
        dimensions: resolution.descriptor.dimensions,
        filters: resolution.descriptor.filters,
        relevance_threshold,
        candidates: resolution
            .candidates
            .into_iter()
            .map(|c| CandidateSummary {
                name: c.entry.name,
                score: c.score,
            })
            .collect(),
        data: answer.data,
    }))
}
