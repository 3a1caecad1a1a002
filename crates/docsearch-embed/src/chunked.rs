//! Chunk-and-average document embedding.
//!
//! Short texts go to the model in one call. Longer texts are cut into
//! contiguous fixed-size character chunks and the chunk vectors are averaged
//! element-wise, so every document ends up with a single vector of the
//! model's dimension.

use docsearch_core::config::EmbeddingSettings;
use docsearch_core::traits::Embedder;
use docsearch_core::{Error, Result};

pub struct DocumentEmbedder {
    inner: Box<dyn Embedder>,
    direct_max_chars: usize,
    chunk_chars: usize,
}

impl DocumentEmbedder {
    pub fn new(inner: Box<dyn Embedder>, settings: &EmbeddingSettings) -> Self {
        Self::with_limits(inner, settings.direct_max_chars, settings.chunk_chars)
    }

    pub fn with_limits(inner: Box<dyn Embedder>, direct_max_chars: usize, chunk_chars: usize) -> Self {
        Self { inner, direct_max_chars, chunk_chars: chunk_chars.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.inner.dim()
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        let chars = text.chars().count();
        let inputs = if chars <= self.direct_max_chars {
            vec![text.to_string()]
        } else {
            split_chars(text, self.chunk_chars)
        };
        tracing::debug!(chars, calls = inputs.len(), "embedding text");

        let vectors = self.inner.embed_batch(&inputs)?;
        if vectors.len() != inputs.len() {
            return Err(Error::Embedding(format!("expected {} vectors, model returned {}", inputs.len(), vectors.len())));
        }
        let dim = self.inner.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::Embedding(format!("expected {dim}-dimensional vectors, got {}", bad.len())));
        }
        Ok(mean_vectors(&vectors, dim))
    }
}

/// Contiguous chunks of `size` characters; the last one may be shorter.
pub fn split_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size.max(1)).map(|c| c.iter().collect()).collect()
}

fn mean_vectors(vectors: &[Vec<f32>], dim: usize) -> Vec<f32> {
    let mut mean = vec![0f32; dim];
    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v) {
            *m += x;
        }
    }
    let n = vectors.len().max(1) as f32;
    mean.iter_mut().for_each(|m| *m /= n);
    mean
}
