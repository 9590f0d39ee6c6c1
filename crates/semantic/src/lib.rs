//! metriq embedding index
//!
//! Turns metric descriptions and question phrases into vectors in one shared
//! space, and ranks catalog rows against a phrase by cosine similarity.
//!
//! Three modes:
//!
//! - **onnx** (default) - run `all-MiniLM-L6-v2` locally through ONNX Runtime.
//!   Model and tokenizer are downloaded on first use when missing. Requires the
//!   `onnx` cargo feature, on by default.
//! - **api** - call a remote feature-extraction endpoint (Hugging Face router,
//!   OpenAI `/embeddings`, or a custom `{texts}` service).
//! - **fast** - deterministic hash-seeded vectors. No network, no model. Only
//!   byte-identical text scores 1.0, so it has to be enabled explicitly with
//!   `allow_stub` and is meant for tests.
//!
//! There is no fallback between modes: a table built from mixed vector spaces
//! would rank garbage, so encode failures propagate.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{Embedder, EmbeddingTable, SemanticConfig};
//!
//! # async fn run() -> Result<(), semantic::SemanticError> {
//! let embedder = Embedder::new(SemanticConfig::default())?;
//! let rows = embedder
//!     .embed_batch(&["Total revenue", "Daily active users"])
//!     .await?;
//! let table = EmbeddingTable::from_rows(rows)?;
//!
//! let query = embedder.embed("revenue").await?;
//! let hits = table.top_k(&query, 5)?;
//! # let _ = hits;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod index;

mod api;
#[cfg(feature = "onnx")]
mod assets;
mod normalize;
#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
mod pool;
mod stub;

pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::index::{EmbeddingTable, ScoredRow};
pub use crate::normalize::cosine_similarity;

use crate::api::ApiBackend;
use crate::normalize::l2_normalize_in_place;
#[cfg(feature = "onnx")]
use crate::onnx::OnnxBackend;
use crate::stub::{make_stub_vector, stub_dimension};
use tracing::debug;

#[derive(Debug, Clone)]
enum Backend {
    Stub,
    Api(ApiBackend),
    #[cfg(feature = "onnx")]
    Onnx(OnnxBackend),
}

/// Encoder for one configured model.
///
/// Cheap to clone; clones share the HTTP connection pool and the loaded
/// local model.
#[derive(Debug, Clone)]
pub struct Embedder {
    cfg: SemanticConfig,
    backend: Backend,
}

impl Embedder {
    /// Validates `cfg` and prepares the backend it selects.
    pub fn new(cfg: SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let backend = match cfg.mode.as_str() {
            "api" => Backend::Api(ApiBackend::new(&cfg)?),
            #[cfg(feature = "onnx")]
            "onnx" => Backend::Onnx(OnnxBackend::new(&cfg)),
            _ => Backend::Stub,
        };
        Ok(Self { cfg, backend })
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.cfg
    }

    /// Vector width when it is known ahead of time (fast mode). Real models
    /// report theirs through the vectors they return.
    pub fn dim(&self) -> Option<usize> {
        match self.backend {
            Backend::Stub => Some(stub_dimension(&self.cfg.tier)),
            _ => None,
        }
    }

    /// Encodes a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| SemanticError::Inference("no embedding returned".into()))
    }

    /// Encodes `texts` in order, in chunks of `batch_size`.
    ///
    /// All-or-nothing: the first failing chunk aborts the whole call.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if let Backend::Stub = self.backend {
            return Ok(texts
                .iter()
                .map(|text| make_stub_vector(text, &self.cfg))
                .collect());
        }

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.cfg.batch_size.max(1)) {
            let mut vectors = self.encode_chunk(chunk).await?;
            if self.cfg.normalize {
                vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
            }
            out.extend(vectors);
        }
        debug!(count = out.len(), mode = %self.cfg.mode, "encoded texts");
        Ok(out)
    }

    async fn encode_chunk(&self, chunk: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        match &self.backend {
            Backend::Stub => Ok(chunk
                .iter()
                .map(|text| make_stub_vector(text, &self.cfg))
                .collect()),
            Backend::Api(api) => api.embed_texts(chunk).await,
            #[cfg(feature = "onnx")]
            Backend::Onnx(onnx) => onnx.embed_texts(chunk).await,
        }
    }
}
