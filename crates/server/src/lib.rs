//! metriq server - HTTP front end for natural-language metric questions
//!
//! Loads the metrics catalog once, embeds its descriptions, and then answers
//! `GET /query/{question}` by resolving the question to a metric query and
//! returning the catalog's data for it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - service information
//! - `GET /health` - liveness check
//! - `GET /ready` - readiness check with catalog size and embedding dimension
//! - `GET /query/{question}?n=5&rel=0` - resolve a question and fetch its data
//!
//! Errors come back as `{"error": {"code": "...", "message": "..."}}` with a
//! status that reflects the failure (429 when the completion service stayed
//! rate limited, 502 for malformed model replies or catalog failures, and so on).

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
