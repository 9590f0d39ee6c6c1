use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{SemanticConfig, SemanticError};

/// On-disk locations of the model and tokenizer, once both are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) async fn resolve_model_assets(
    cfg: &SemanticConfig,
) -> Result<ModelAssets, SemanticError> {
    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), || {
        SemanticError::ModelNotFound(cfg.model_path.display().to_string())
    })
    .await?;

    let tokenizer_target = tokenizer_storage_path(cfg)?;
    let tokenizer_path = ensure_local_file(&tokenizer_target, cfg.tokenizer_url.as_deref(), || {
        SemanticError::TokenizerMissing(tokenizer_target.display().to_string())
    })
    .await?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Explicit `tokenizer_path`, else a file named after the URL next to the model.
fn tokenizer_storage_path(cfg: &SemanticConfig) -> Result<PathBuf, SemanticError> {
    if let Some(path) = &cfg.tokenizer_path {
        return Ok(path.clone());
    }

    if let Some(url) = &cfg.tokenizer_url {
        let inferred_name = infer_filename_from_url(url).unwrap_or_else(|| "tokenizer.json".into());
        let base_dir = cfg
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok(base_dir.join(inferred_name));
    }

    Err(SemanticError::TokenizerMissing(cfg.model_name.clone()))
}

async fn ensure_local_file<F>(
    target: &Path,
    remote_url: Option<&str>,
    on_missing: F,
) -> Result<PathBuf, SemanticError>
where
    F: FnOnce() -> SemanticError,
{
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    match remote_url {
        Some(url) => {
            download_to_path(target, url).await?;
            Ok(target.to_path_buf())
        }
        None => Err(on_missing()),
    }
}

/// Downloads `url` into `target`, creating parent directories as needed.
///
/// The body is written to a sibling `.part` file and renamed into place.
async fn download_to_path(target: &Path, url: &str) -> Result<(), SemanticError> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    info!(url, target = %target.display(), "downloading model asset");
    let response = reqwest::get(url)
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SemanticError::Download(format!(
            "unexpected status {status} while fetching {url}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let partial = target.with_extension("part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, target)?;
    Ok(())
}

/// Last non-empty path segment of `url`, without query or fragment.
fn infer_filename_from_url(url: &str) -> Option<String> {
    url.split(['?', '#'])
        .next()
        .unwrap_or(url)
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
