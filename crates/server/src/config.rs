use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds. Must cover the completion retry backoff.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the pipeline YAML; defaults apply when unset.
    #[serde(default)]
    pub pipeline_config: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            pipeline_config: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.{toml,yaml,json}` and
    /// `METRIQ_SERVER__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("METRIQ_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8500
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
