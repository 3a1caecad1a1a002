use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use docsearch_core::config::EmbeddingSettings;
use docsearch_core::traits::Embedder;
use docsearch_core::{Error, Result};
use tokenizers::Tokenizer;

pub mod chunked;
mod device;
mod pool;
mod tokenize;

pub use chunked::DocumentEmbedder;
pub use pool::{l2_normalize, masked_mean};

pub(crate) fn candle_err(e: candle_core::Error) -> Error {
    Error::Embedding(e.to_string())
}

const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Sentence-transformers BERT checkpoint run with candle, mean-pooled.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_tokens: usize,
    normalize: bool,
}

impl BertEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let model_dir = resolve_model_dir(settings)?;
        Self::from_dir(&model_dir, settings)
    }

    pub fn from_dir(model_dir: &Path, settings: &EmbeddingSettings) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(model = %settings.model, dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Embedding(format!("failed to load tokenizer from {}: {e}", tokenizer_path.display())))?;

        let config_raw = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: BertConfig =
            serde_json::from_str(&config_raw).map_err(|e| Error::Embedding(format!("invalid config.json: {e}")))?;
        let raw: serde_json::Value =
            serde_json::from_str(&config_raw).map_err(|e| Error::Embedding(format!("invalid config.json: {e}")))?;
        let dim = raw.get("hidden_size").and_then(serde_json::Value::as_u64).map_or(settings.dims, |d| d as usize);
        if dim != settings.dims {
            return Err(Error::InvalidConfig(format!(
                "model {} produces {dim}-dimensional vectors but embedding.dims is {}",
                settings.model, settings.dims
            )));
        }

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config).map_err(candle_err)?;
        tracing::info!(dim, max_tokens = settings.max_tokens, "embedding model ready");

        Ok(Self { model, tokenizer, device, dim, max_tokens: settings.max_tokens, normalize: settings.normalize })
    }

    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (ids, mask) = tokenize::tokenize_on_device(&self.tokenizer, text, self.max_tokens, &self.device)?;
        let pooled = ids
            .zeros_like()
            .and_then(|token_type_ids| self.model.forward(&ids, &token_type_ids, Some(&mask)))
            .and_then(|hidden| masked_mean(&hidden, &mask))
            .and_then(|pooled| if self.normalize { l2_normalize(&pooled) } else { Ok(pooled) })
            .and_then(|pooled| pooled.to_device(&Device::Cpu))
            .and_then(|pooled| pooled.squeeze(0))
            .and_then(|pooled| pooled.to_vec1::<f32>())
            .map_err(candle_err)?;
        if pooled.len() != self.dim {
            return Err(Error::Embedding(format!("model returned {} values, expected {}", pooled.len(), self.dim)));
        }
        tracing::trace!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded text");
        Ok(pooled)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_tokens }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join(WEIGHT_FILES[0]);
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device).map_err(candle_err);
    }
    let pickle = model_dir.join(WEIGHT_FILES[1]);
    if pickle.exists() {
        let tensors = candle_core::pickle::read_all(&pickle).map_err(candle_err)?;
        return Ok(tensors.into_iter().collect());
    }
    Err(Error::Embedding(format!("no model weights found in {}", model_dir.display())))
}

/// Hash-based stand-in for the real model: deterministic, L2-normalized,
/// loads nothing from disk.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-6 {
            for x in &mut v { *x /= norm; }
        } else {
            v[0] = 1.0;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake || fake_requested_by_env() {
        tracing::info!(dim = settings.dims, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.dims)));
    }
    Ok(Box::new(BertEmbedder::new(settings)?))
}

/// Local directory holding `config.json`, `tokenizer.json` and weights for
/// the configured model, downloading it through the Hugging Face hub as a
/// last resort.
pub fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let configured = settings.model_dir.iter().map(|d| docsearch_core::config::expand_path(d));
    let from_env = ["APP_MODEL_DIR", "MODEL_DIR"].into_iter().filter_map(|k| std::env::var(k).ok()).map(PathBuf::from);
    let short_name = settings.model.rsplit('/').next().unwrap_or(&settings.model);
    let local = [Path::new("models").join(short_name), Path::new("../models").join(short_name)];

    for candidate in configured.chain(from_env).chain(local) {
        if candidate.join("config.json").exists() {
            tracing::debug!(dir = %candidate.display(), "using local model dir");
            return Ok(candidate);
        }
    }
    download_model(&settings.model)
}

fn download_model(model_id: &str) -> Result<PathBuf> {
    tracing::info!(model = model_id, "model not found locally, fetching from the Hugging Face hub");
    let hub_err = |e: hf_hub::api::sync::ApiError| Error::Embedding(format!("failed to fetch {model_id}: {e}"));
    let repo = hf_hub::api::sync::Api::new().map_err(hub_err)?.model(model_id.to_string());
    let config = repo.get("config.json").map_err(hub_err)?;
    repo.get("tokenizer.json").map_err(hub_err)?;
    if repo.get(WEIGHT_FILES[0]).is_err() {
        repo.get(WEIGHT_FILES[1]).map_err(hub_err)?;
    }
    config
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Embedding(format!("unexpected hub cache layout for {model_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_embedder_handles_blank_input() {
        let e = FakeEmbedder::new(8);
        let v = e.embed_batch(&["   ".to_string()]).unwrap();
        assert_eq!(v[0].len(), 8);
        assert!((v[0].iter().map(|x| x * x).sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn explicit_model_dir_wins_when_it_has_a_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.json"), "{}").unwrap();
        let settings = EmbeddingSettings { model_dir: Some(tmp.path().display().to_string()), ..Default::default() };
        assert_eq!(resolve_model_dir(&settings).unwrap(), tmp.path());
    }
}
