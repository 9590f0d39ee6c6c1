use catalog::CatalogSnapshot;
use semantic::{Embedder, EmbeddingTable};
use tracing::info;

use crate::{Candidate, ResolveError};

/// Catalog snapshot plus its embedding table, row-aligned.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    snapshot: CatalogSnapshot,
    table: EmbeddingTable,
}

impl CatalogIndex {
    /// Encodes every description in snapshot order. Any failure aborts the build.
    pub async fn build(snapshot: CatalogSnapshot, embedder: &Embedder) -> Result<Self, ResolveError> {
        let rows = embedder.embed_batch(&snapshot.descriptions()).await?;
        let table = EmbeddingTable::from_rows(rows)?;
        let index = Self::from_parts(snapshot, table)?;
        info!(
            metrics = index.len(),
            dim = index.dim(),
            "catalog embedding index built"
        );
        Ok(index)
    }

    /// Pairs a snapshot with an already built table, checking they line up.
    pub fn from_parts(snapshot: CatalogSnapshot, table: EmbeddingTable) -> Result<Self, ResolveError> {
        if snapshot.len() != table.len() {
            return Err(ResolveError::IndexMismatch {
                entries: snapshot.len(),
                rows: table.len(),
            });
        }
        Ok(Self { snapshot, table })
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.table.dim()
    }

    /// Top `k` catalog entries for an encoded phrase, best first.
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>, ResolveError> {
        let hits = self.table.top_k(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                self.snapshot.get(hit.index).map(|entry| Candidate {
                    index: hit.index,
                    score: hit.score,
                    entry: entry.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::MetricEntry;
    use semantic::SemanticConfig;

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(vec![
            MetricEntry::new("dau", "Daily active users", ["day", "country"]),
            MetricEntry::new("revenue", "Total revenue", ["region", "day"]),
            MetricEntry::new("churn", "Churn rate", ["month"]),
        ])
    }

    #[tokio::test]
    async fn build_aligns_rows_with_snapshot() {
        let embedder = Embedder::new(SemanticConfig::stub()).unwrap();
        let index = CatalogIndex::build(snapshot(), &embedder).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dim(), 384);

        let query = embedder.embed("Churn rate").await.unwrap();
        let ranked = index.rank(&query, 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 2);
        assert_eq!(ranked[0].entry.name, "churn");
    }

    #[tokio::test]
    async fn empty_catalog_ranks_nothing() {
        let embedder = Embedder::new(SemanticConfig::stub()).unwrap();
        let index = CatalogIndex::build(CatalogSnapshot::default(), &embedder)
            .await
            .unwrap();
        assert!(index.is_empty());
        let query = embedder.embed("anything").await.unwrap();
        assert!(index.rank(&query, 5).unwrap().is_empty());
    }

    #[test]
    fn mismatched_parts_rejected() {
        let table = EmbeddingTable::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            CatalogIndex::from_parts(snapshot(), table),
            Err(ResolveError::IndexMismatch { entries: 3, rows: 1 })
        ));
    }
}
