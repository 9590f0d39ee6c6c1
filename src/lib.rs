//! Workspace umbrella crate for metriq.
//!
//! Ties the catalog, embedding, completion and resolver crates together behind
//! one YAML config and one entry point: [`Pipeline::bootstrap`] loads the
//! catalog, embeds it and returns a ready pipeline; [`Pipeline::query`] answers
//! a question end to end, including the downstream data fetch.

pub mod config;

pub use catalog::{CatalogClient, CatalogError, CatalogSnapshot, MetricEntry};
pub use completion::{CompletionClient, CompletionConfig, CompletionError, CompletionService};
pub use config::{CatalogYamlConfig, ConfigLoadError, MetriqConfig};
pub use resolver::{
    CatalogIndex, QueryDescriptor, Resolution, ResolveError, ResolvedQuery, ResolverConfig,
    ResolverContext,
};
pub use semantic::{Embedder, SemanticConfig, SemanticError};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// Start-up failures. Any of these stops the service from coming up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("embedding: {0}")]
    Semantic(#[from] SemanticError),
    #[error("completion: {0}")]
    Completion(#[from] CompletionError),
    #[error("resolver: {0}")]
    Resolve(#[from] ResolveError),
}

/// Per-question failures from [`Pipeline::query`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("catalog data fetch failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// A resolved question together with the catalog's data for it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub resolution: Resolution,
    pub data: Value,
}

/// Resolver context plus the catalog client used for data fetches.
#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: Arc<ResolverContext>,
    catalog: CatalogClient,
}

impl Pipeline {
    pub fn new(resolver: Arc<ResolverContext>, catalog: CatalogClient) -> Self {
        Self { resolver, catalog }
    }

    /// Fetches the catalog, embeds every description and wires the completion
    /// client. Runs once at start-up.
    pub async fn bootstrap(config: &MetriqConfig) -> Result<Self, BootstrapError> {
        config.validate()?;

        let catalog = CatalogClient::new(
            &config.catalog.url,
            Duration::from_secs(config.catalog.timeout_secs),
        )?;
        let snapshot = catalog.fetch_snapshot().await?;

        let embedder = Embedder::new(config.semantic.clone())?;
        let index = CatalogIndex::build(snapshot, &embedder).await?;
        let completion = CompletionClient::from_config(&config.completion)?;

        let resolver = ResolverContext::new(
            Arc::new(index),
            embedder,
            completion,
            config.resolver_config(),
        )?;

        info!(
            catalog = %config.catalog.url,
            metrics = resolver.index().len(),
            model = %config.completion.model,
            "pipeline ready"
        );
        Ok(Self::new(Arc::new(resolver), catalog))
    }

    pub fn resolver(&self) -> &ResolverContext {
        &self.resolver
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// Resolves `question` and fetches the matching data from the catalog.
    pub async fn query(&self, question: &str, top_k: Option<usize>) -> Result<Answer, PipelineError> {
        let resolution = self.resolver.resolve(question, top_k).await?;
        let descriptor = &resolution.descriptor;
        let data = self
            .catalog
            .fetch_data(&descriptor.metric, &descriptor.dimensions, &descriptor.filters)
            .await?;
        Ok(Answer { resolution, data })
    }
}
