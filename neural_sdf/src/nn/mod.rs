//! Neural network modules for conditional SDF decoding.
//!
//! - [`ConditionalDecoder`]: the shared auto-decoder
//! - [`TransformerLayer`]: attention block standing in for a linear layer
//! - [`WeightNormLinear`]: linear layer with weight normalization

mod decoder;
mod transformer;
mod weight_norm;

pub use decoder::{ConditionalDecoder, DecoderLayer, LayerTransform};
pub use transformer::TransformerLayer;
pub use weight_norm::WeightNormLinear;
