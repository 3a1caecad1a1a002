use candle_core::{Result, Tensor};

/// Attention-masked mean over the token axis: `[B,T,H]` -> `[B,H]`.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_broadcast)?.sum(1)?;
    let lengths = mask.sum_keepdim(1)?;
    sum.broadcast_div(&lengths)
}

/// Row-wise L2 normalization of a `[B,H]` tensor.
pub fn l2_normalize(pooled: &Tensor) -> Result<Tensor> {
    let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, 1e-12)?;
    pooled.broadcast_div(&norm)
}
