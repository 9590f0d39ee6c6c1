use crate::config::ServerConfig;
use anyhow::Context;
use metriq::{MetriqConfig, Pipeline};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Resolver and catalog client, built once at start-up
    pub pipeline: Pipeline,
}

impl ServerState {
    pub fn new(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    /// Load the pipeline config, fetch and embed the catalog.
    pub async fn bootstrap(config: ServerConfig) -> anyhow::Result<Self> {
        let pipeline_config = pipeline_config(&config)?.with_env_overrides();

        let pipeline = Pipeline::bootstrap(&pipeline_config)
            .await
            .context("building resolver pipeline")?;

        Ok(Self::new(config, pipeline))
    }
}

/// The pipeline file named by `pipeline_config`, or the built-in defaults.
pub fn pipeline_config(config: &ServerConfig) -> anyhow::Result<MetriqConfig> {
    match config.pipeline_config.as_deref() {
        Some(path) => MetriqConfig::from_file(path)
            .with_context(|| format!("loading pipeline config from {path}")),
        None => Ok(MetriqConfig::default()),
    }
}
