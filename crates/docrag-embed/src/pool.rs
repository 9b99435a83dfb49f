use anyhow::Result;
use candle_core::Tensor;

/// Sentence vector from token states: mean over unmasked tokens, then L2
/// normalisation. `hidden` is `[B,T,H]`, `attention_mask` is `[B,T]`, the
/// result is `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let _ = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    // An all-padding row would divide by zero.
    let counts = mask.sum(1)?.maximum(1f32)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12f32)?;
    Ok(mean.broadcast_div(&norms)?)
}
