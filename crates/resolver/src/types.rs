use catalog::MetricEntry;
use serde::Serialize;

/// Stage-2 answer after parsing: one metric and its column choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedQuery {
    pub metric: String,
    pub group_bys: Vec<String>,
    pub filters: Vec<String>,
}

/// What gets sent to the catalog's data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    pub metric: String,
    /// Group-by columns, comma-joined.
    pub dimensions: String,
    /// Filter expressions, comma-joined.
    pub filters: String,
}

/// A catalog row surfaced by the similarity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub index: usize,
    pub score: f32,
    pub entry: MetricEntry,
}

/// Trace of one resolved question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub question: String,
    /// Metric phrase pulled out in stage 1.
    pub extracted_metric: String,
    /// Ranked candidates offered to stage 2, best first.
    pub candidates: Vec<Candidate>,
    pub resolved: ResolvedQuery,
    pub descriptor: QueryDescriptor,
}
