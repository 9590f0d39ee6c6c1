//! Local sentence-embedding inference with ONNX Runtime.
//!
//! Sessions are not shareable across threads, so each blocking worker keeps
//! its own loaded model in a thread-local cache keyed by asset paths.

use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell as AsyncOnceCell;
use tracing::{debug, info};

use crate::assets::{resolve_model_assets, ModelAssets};
use crate::pool::pool_token_embeddings;
use crate::{SemanticConfig, SemanticError};

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

thread_local! {
    static MODEL_CACHE: RefCell<HashMap<ModelAssets, Rc<CachedModel>>> =
        RefCell::new(HashMap::new());
}

/// Local model handle. Assets are resolved (and downloaded if needed) on the
/// first encode; clones share that resolution.
#[derive(Debug, Clone)]
pub(crate) struct OnnxBackend {
    cfg: SemanticConfig,
    assets: Arc<AsyncOnceCell<ModelAssets>>,
}

impl OnnxBackend {
    pub(crate) fn new(cfg: &SemanticConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            assets: Arc::new(AsyncOnceCell::new()),
        }
    }

    pub(crate) async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let assets = self
            .assets
            .get_or_try_init(|| resolve_model_assets(&self.cfg))
            .await?
            .clone();
        let owned: Vec<String> = texts.iter().map(|text| text.to_string()).collect();
        let max_sequence_length = self.cfg.max_sequence_length;

        tokio::task::spawn_blocking(move || {
            let handle = get_or_load_model_handle(&assets)?;
            run_onnx_embeddings(&handle, &owned, max_sequence_length)
        })
        .await
        .map_err(|e| SemanticError::Inference(format!("inference task failed: {e}")))?
    }
}

struct CachedModel {
    tokenizer: Tokenizer,
    session: RefCell<Session<'static>>,
}

impl CachedModel {
    fn load(assets: &ModelAssets) -> Result<Self, SemanticError> {
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let session = ort_environment()?
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(assets.model_path.clone())
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        info!(model = %assets.model_path.display(), "loaded onnx model");
        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

fn get_or_load_model_handle(assets: &ModelAssets) -> Result<Rc<CachedModel>, SemanticError> {
    MODEL_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(handle) = cache.get(assets) {
            return Ok(handle.clone());
        }

        let handle = Rc::new(CachedModel::load(assets)?);
        cache.insert(assets.clone(), handle.clone());
        Ok(handle)
    })
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("metriq-semantic")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}

fn run_onnx_embeddings(
    handle: &CachedModel,
    texts: &[String],
    max_sequence_length: usize,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let (encoded, max_len) = encode_documents(&handle.tokenizer, texts, max_sequence_length)?;
    let (input_ids, attn_mask) = build_padded_arrays(encoded, max_len)?;
    let mask: Vec<i64> = attn_mask.iter().copied().collect();

    let (shape, values) = execute_session(&handle.session, input_ids, attn_mask)?;
    let vectors = pool_token_embeddings(&shape, &values, &mask)?;
    debug!(count = vectors.len(), "encoded texts via onnx");
    Ok(vectors)
}

struct EncodedDoc {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

fn encode_documents(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_sequence_length: usize,
) -> Result<(Vec<EncodedDoc>, usize), SemanticError> {
    let mut encoded = Vec::with_capacity(texts.len());
    let mut max_len = 0usize;

    for text in texts {
        let encoding = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        ids.truncate(max_sequence_length);
        mask.truncate(max_sequence_length);
        max_len = max_len.max(ids.len());
        encoded.push(EncodedDoc { ids, mask });
    }

    Ok((encoded, max_len))
}

fn build_padded_arrays(
    encoded: Vec<EncodedDoc>,
    max_len: usize,
) -> Result<(Array2<i64>, Array2<i64>), SemanticError> {
    let seq_len = max_len.max(1);
    let batch = encoded.len();
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedDoc { ids, mask } in encoded {
        if ids.len() != mask.len() {
            return Err(SemanticError::Inference(
                "tokenizer produced mismatched id/mask lengths".into(),
            ));
        }
        let pad = seq_len.saturating_sub(ids.len());
        id_storage.extend(ids);
        mask_storage.extend(mask);
        id_storage.extend(std::iter::repeat_n(0, pad));
        mask_storage.extend(std::iter::repeat_n(0, pad));
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let attn_mask = Array::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    Ok((input_ids, attn_mask))
}

/// Runs the session and returns the first output as `(shape, flat values)`.
fn execute_session(
    session: &RefCell<Session<'static>>,
    input_ids: Array2<i64>,
    attn_mask: Array2<i64>,
) -> Result<(Vec<usize>, Vec<f32>), SemanticError> {
    let (batch, seq_len) = input_ids.dim();
    let mut guard = session.borrow_mut();
    let session_ref = &mut *guard;
    let mut runtime_inputs = Vec::with_capacity(session_ref.inputs.len());
    let mut input_ids_tensor = Some(input_ids);
    let mut attn_mask_tensor = Some(attn_mask);

    for input in &session_ref.inputs {
        match input.name.as_str() {
            "input_ids" => {
                let tensor = input_ids_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig("model requested `input_ids` twice".into())
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "attention_mask" => {
                let tensor = attn_mask_tensor.take().ok_or_else(|| {
                    SemanticError::InvalidConfig("model requested `attention_mask` twice".into())
                })?;
                runtime_inputs.push(tensor.into_dyn());
            }
            "token_type_ids" => {
                runtime_inputs.push(Array::from_elem((batch, seq_len), 0_i64).into_dyn());
            }
            other => {
                return Err(SemanticError::Inference(format!(
                    "unsupported model input '{other}'"
                )))
            }
        }
    }

    if runtime_inputs.is_empty() {
        return Err(SemanticError::Inference(
            "model did not declare any inputs".into(),
        ));
    }

    let outputs = session_ref
        .run::<i64, f32, _>(runtime_inputs)
        .map_err(|e| SemanticError::Inference(e.to_string()))?;
    let output_tensor = outputs
        .into_iter()
        .next()
        .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))?;

    let shape = output_tensor.shape().to_vec();
    let values: Vec<f32> = output_tensor.iter().copied().collect();
    Ok((shape, values))
}
