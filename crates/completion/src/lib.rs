//! metriq completion client
//!
//! Sends a prompt to a text-completion service at temperature 0 and returns the
//! first choice. HTTP 429 is the only retried failure: the client waits a fixed
//! backoff and tries again, up to `max_retries` attempts in total, then gives
//! up with [`CompletionError::RetriesExhausted`].
//!
//! ```no_run
//! use completion::{CompletionClient, CompletionConfig};
//!
//! # async fn run() -> Result<(), completion::CompletionError> {
//! let client = CompletionClient::from_config(&CompletionConfig::default())?;
//! let reply = client.complete("Say hi", 5, "gpt-3.5-turbo").await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
mod serde_millis;

pub use crate::client::{CompletionClient, CompletionService, HttpCompletionService};
pub use crate::config::{CompletionConfig, API_KEY_ENV};
pub use crate::error::CompletionError;
pub use crate::retry::RetryPolicy;
