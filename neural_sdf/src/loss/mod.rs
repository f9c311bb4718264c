//! Loss functions for auto-decoder training.
//!
//! - Clamped L1 distance between predicted and sampled signed distances
//! - Latent code magnitude regularization

mod regularization;
mod sdf;

pub use regularization::code_regularization;
pub use sdf::SdfLoss;
