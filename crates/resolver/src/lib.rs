//! metriq resolver
//!
//! Answers "which metric, grouped and filtered how?" for a natural-language
//! question in two completion rounds:
//!
//! 1. ask the model to name the metric (`Metric: <phrase>`),
//! 2. rank catalog entries against that phrase by embedding similarity,
//! 3. show the model the top candidates with their dimensions and ask for
//!    exactly three lines: `Metric:`, `GroupBys:`, `Filters:`,
//! 4. assemble the reply into a [`QueryDescriptor`] for the catalog's data
//!    endpoint.
//!
//! Every failure is a per-question [`ResolveError`]; rate-limit exhaustion
//! included.

pub mod assemble;
pub mod config;
pub mod context;
pub mod error;
pub mod index;
pub mod parse;
pub mod prompt;
pub mod types;

pub use crate::assemble::assemble;
pub use crate::config::ResolverConfig;
pub use crate::context::{ResolveState, ResolverContext};
pub use crate::error::{PromptStage, ResolveError};
pub use crate::index::CatalogIndex;
pub use crate::parse::ParsedReply;
pub use crate::types::{Candidate, QueryDescriptor, Resolution, ResolvedQuery};
