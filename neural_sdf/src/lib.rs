//! # neural_sdf
//!
//! Class-conditioned DeepSDF auto-decoding with Burn.
//!
//! A shared decoder maps a per-shape latent code, a query point and an
//! optional one-hot class embedding to a signed distance. Latent codes and
//! decoder weights are optimized jointly; trained codes can be blended to
//! reconstruct a sequence of meshes between two shapes.
//!
//! ## Features
//!
//! - **ShapeDataset**: eager or lazy access to per-shape SDF samples with
//!   balanced random subsampling
//! - **ConditionalDecoder**: MLP with skip connections, layer or weight
//!   normalization, dropout, tanh output and optional attention blocks
//! - **Training**: clamped L1 loss, latent code regularization, Adam
//! - **Interpolation**: linear blends of latent codes and class embeddings
//!   handed to a mesh extractor
//!
//! ## Quick Start
//!
//! ```ignore
//! use neural_sdf::prelude::*;
//! use burn::backend::{Autodiff, NdArray};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let specs = ExperimentSpecs::from_experiment_dir("experiments/chairs".as_ref())?;
//! let split = SplitSpec::from_file("splits/chairs_train.json".as_ref())?;
//! let dataset = ShapeDataset::new(
//!     "data",
//!     &split,
//!     &DatasetConfig::new().with_subsample(Some(16384)).with_use_class_embedding(true),
//!     specs.class_embedding_table()?,
//! )?;
//!
//! let device = Default::default();
//! let mut trainer = AutoDecoderTrainer::<MyBackend>::new(
//!     &specs.decoder_config(),
//!     TrainingConfig::new(),
//!     dataset.len(),
//!     &device,
//! )?;
//! trainer.train(&dataset, &mut rand::thread_rng())?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! sdf_io (archives, splits, latent files)
//!     │
//!     ▼
//! ShapeDataset ──► AutoDecoderTrainer ──► checkpoint + latent codes
//!                         │                        │
//!                         ▼                        ▼
//!                 ConditionalDecoder ◄── LatentInterpolationDriver ──► MeshExtractor
//! ```
//!
//! ## Feature Flags
//!
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod error;
pub mod interpolation;
pub mod loss;
pub mod nn;
pub mod training;

// Re-export key types for convenience
pub use config::{DatasetConfig, DecoderConfig, ExperimentSpecs, InterpolationConfig, TrainingConfig};
pub use data::{ClassEmbeddingTable, ShapeDataset};
pub use error::{NeuralSdfError, Result};
pub use interpolation::{interpolate_vectors, LatentInterpolationDriver, MeshExtractor};
pub use nn::ConditionalDecoder;
pub use training::{AutoDecoder, AutoDecoderTrainer};

// Re-export from sdf_io for convenience
pub use sdf_io::{SampleStore, ShapeEntry, SplitSpec};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        DatasetConfig, DecoderConfig, ExperimentSpecs, InterpolationConfig, NetworkSpecs,
        TrainingConfig, TransformerLayerConfig, CLASS_EMBEDDING_WIDTH, XYZ_WIDTH,
    };
    pub use crate::data::{one_hot, ClassEmbeddingTable, Materialization, ShapeDataset};
    pub use crate::error::{NeuralSdfError, Result};
    pub use crate::interpolation::{
        evaluate_grid, interpolate_vectors, InterpolationReport, LatentInterpolationDriver,
        MeshExtractor, MeshRequest, ReconstructionDirs,
    };
    pub use crate::loss::{code_regularization, SdfLoss};
    pub use crate::nn::{ConditionalDecoder, TransformerLayer, WeightNormLinear};
    pub use crate::training::{
        checkpoint_exists, export_latent_codes, find_latest_checkpoint, load_checkpoint,
        save_checkpoint, AutoDecoder, AutoDecoderTrainer, CheckpointMetadata, SdfBatch,
        TrainMetrics,
    };

    pub use sdf_io::{SampleStore, ShapeEntry, SplitSpec};
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_public_api() {
        let _dataset = DatasetConfig::default();
        let _training = TrainingConfig::default();
        let _interpolation = InterpolationConfig::new(5);
    }

    #[test]
    fn test_decoder_from_specs() {
        let specs = ExperimentSpecs::from_json_str(
            r#"{"CodeLength": 16, "NetworkSpecs": {"dims": [32, 32, 32], "latent_in": [2], "use_tanh": true}}"#,
        )
        .unwrap();
        let device = Default::default();
        let decoder: ConditionalDecoder<TestBackend> = specs.decoder_config().init(&device).unwrap();

        assert_eq!(decoder.input_width(), 19);
        assert!(!decoder.class_conditioned());
    }
}
