use candle_core::{Device, Tensor};
use docsearch_core::{Error, Result};
use tokenizers::Tokenizer;

/// Encode one text as `[1,T]` id and mask tensors, truncated to `max_len`.
/// A single sequence needs no padding.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    let tensors = Tensor::new(ids.as_slice(), device)
        .and_then(|t| t.unsqueeze(0))
        .and_then(|ids| Tensor::new(mask.as_slice(), device).and_then(|m| m.unsqueeze(0)).map(|mask| (ids, mask)));
    tensors.map_err(crate::candle_err)
}
