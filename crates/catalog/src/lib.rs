//! metriq catalog access
//!
//! The metrics catalog is an external service. This crate knows the two calls
//! the resolver needs from it:
//!
//! - `GET <catalog>/metrics` once at start-up, producing a [`CatalogSnapshot`]
//! - `GET <catalog>/data/<metric>/?dimensions=..&filters=..` per answered question
//!
//! The snapshot is immutable once loaded. Its row order is what the embedding
//! table is aligned against, so nothing here sorts or dedups entries.

pub mod client;
pub mod error;
pub mod types;

pub use crate::client::CatalogClient;
pub use crate::error::CatalogError;
pub use crate::types::{CatalogSnapshot, MetricEntry};
pub use reqwest::Url;
