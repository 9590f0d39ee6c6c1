use serde::{Deserialize, Serialize};

/// One metric as advertised by the catalog's `/metrics` listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricEntry {
    /// Catalog-unique metric name (uniqueness is assumed, not checked).
    pub name: String,
    /// Free-text description; this is what gets embedded.
    #[serde(default)]
    pub description: String,
    /// Dimensions the metric can be grouped or filtered by, in catalog order.
    #[serde(default)]
    pub dimensions: Vec<String>,
}

impl MetricEntry {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        dimensions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered, read-only view of the catalog taken once at start-up.
///
/// Row `i` of the snapshot lines up with row `i` of the embedding table built
/// from it, so the order here is load-bearing and never changes after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    entries: Vec<MetricEntry>,
}

impl CatalogSnapshot {
    pub fn new(entries: Vec<MetricEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MetricEntry> {
        self.entries.get(index)
    }

    /// Descriptions in snapshot order, ready to hand to an embedder.
    pub fn descriptions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.description.as_str()).collect()
    }
}

impl From<Vec<MetricEntry>> for CatalogSnapshot {
    fn from(entries: Vec<MetricEntry>) -> Self {
        Self::new(entries)
    }
}
