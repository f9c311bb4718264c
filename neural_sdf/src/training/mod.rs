//! Auto-decoder training.
//!
//! This module provides:
//! - `AutoDecoder`: decoder plus per-shape latent code table
//! - `AutoDecoderTrainer`: joint optimization with Adam
//! - Batch collation from dataset samples
//! - Checkpoint save/load and latent code export

mod batch;
mod checkpoint;
mod metrics;
mod model;
mod trainer;

pub use batch::SdfBatch;
pub use checkpoint::{
    checkpoint_exists, export_latent_codes, find_latest_checkpoint, load_checkpoint,
    save_checkpoint, CheckpointMetadata,
};
pub use metrics::TrainMetrics;
pub use model::AutoDecoder;
pub use trainer::AutoDecoderTrainer;
