//! Configuration types for neural_sdf.
//!
//! Burn-style configuration structs for the decoder, datasets, training and
//! interpolation, plus the experiment `specs.json` format.

mod experiment;
mod network;
mod training;

pub use experiment::{ExperimentSpecs, NetworkSpecs, SPECS_FILENAME};
pub use network::{
    DecoderConfig, TransformerLayerConfig, CLASS_EMBEDDING_WIDTH, LATENT_DROPOUT_PROB, XYZ_WIDTH,
};
pub use training::{DatasetConfig, InterpolationConfig, TrainingConfig};
