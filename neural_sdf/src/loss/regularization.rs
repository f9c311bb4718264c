//! Latent code regularization.

use burn::prelude::*;

/// `weight * mean(||code||_2)` over the rows of `codes`.
///
/// `codes` holds one latent code per sample row, so shapes contribute in
/// proportion to their sample count.
pub fn code_regularization<B: Backend>(codes: Tensor<B, 2>, weight: f32) -> Tensor<B, 1> {
    let norms = codes.powf_scalar(2.0).sum_dim(1).sqrt();
    norms.mean().mul_scalar(weight)
}
