use std::cmp::Ordering;

use serde::Serialize;

use crate::normalize::cosine_similarity;
use crate::SemanticError;

/// One ranked row of an [`EmbeddingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredRow {
    /// Row position; the same position in the catalog snapshot.
    pub index: usize,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Dense matrix of row vectors, one per catalog entry, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingTable {
    dim: usize,
    rows: Vec<Vec<f32>>,
}

impl EmbeddingTable {
    /// Builds a table, rejecting rows whose width differs from the first row.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, SemanticError> {
        let dim = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|row| row.len() != dim) {
            return Err(SemanticError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        Ok(Self { dim, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row width; `0` for an empty table.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the `min(k, len)` rows most similar to `query`, best first.
    ///
    /// Equal scores keep catalog order. No threshold is applied. An empty table
    /// yields an empty result for any query.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRow>, SemanticError> {
        if self.rows.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(SemanticError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredRow> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| ScoredRow {
                index,
                score: cosine_similarity(query, row),
            })
            .collect();

        scored.sort_by(rank_order);
        scored.truncate(k);
        Ok(scored)
    }
}

fn rank_order(a: &ScoredRow, b: &ScoredRow) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}
