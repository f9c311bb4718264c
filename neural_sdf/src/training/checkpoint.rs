//! Checkpoint save/load functionality for training state.
//!
//! A checkpoint directory holds:
//! - `metadata.json`: epoch, loss and table size
//! - `config.json`: training configuration
//! - `model.mpk`: decoder weights and latent codes

use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use serde::{Deserialize, Serialize};
use sdf_io::{latent_code_path, save_latent_code, ShapeEntry};

use crate::config::{DecoderConfig, TrainingConfig};
use crate::error::{NeuralSdfError, Result};

use super::model::AutoDecoder;

const METADATA_FILE: &str = "metadata.json";
const CONFIG_FILE: &str = "config.json";
const MODEL_STEM: &str = "model";
const MODEL_FILE: &str = "model.mpk";

/// Checkpoint metadata stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Epochs completed.
    pub epoch: usize,
    /// Mean total loss of the last epoch.
    pub mean_loss: f32,
    /// Rows of the latent code table.
    pub num_shapes: usize,
    /// Checkpoint version for compatibility.
    pub version: u32,
}

impl CheckpointMetadata {
    /// Create metadata for a model after `epoch` epochs.
    pub fn new(epoch: usize, mean_loss: f32, num_shapes: usize) -> Self {
        Self {
            epoch,
            mean_loss,
            num_shapes,
            version: 1,
        }
    }
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Save a model, its training configuration and metadata to `dir`.
pub fn save_checkpoint<B: Backend>(
    dir: &Path,
    model: &AutoDecoder<B>,
    config: &TrainingConfig,
    metadata: &CheckpointMetadata,
) -> Result<()> {
    fs::create_dir_all(dir)?;

    fs::write(dir.join(METADATA_FILE), serde_json::to_string_pretty(metadata)?)?;
    config.save(dir.join(CONFIG_FILE))?;
    model
        .clone()
        .save_file(dir.join(MODEL_STEM), &recorder())
        .map_err(|e| NeuralSdfError::Record {
            message: format!("{:?}", e),
        })?;

    log::info!(
        "Saved checkpoint to {:?} (epoch {}, {} shapes)",
        dir,
        metadata.epoch,
        metadata.num_shapes
    );

    Ok(())
}

/// Load a checkpoint written by [`save_checkpoint`].
///
/// `decoder_config` must describe the saved decoder.
pub fn load_checkpoint<B: Backend>(
    dir: &Path,
    decoder_config: &DecoderConfig,
    device: &B::Device,
) -> Result<(AutoDecoder<B>, TrainingConfig, CheckpointMetadata)> {
    if !checkpoint_exists(dir) {
        return Err(sdf_io::SdfIoError::MissingFile {
            path: dir.join(MODEL_FILE),
        }
        .into());
    }

    let metadata: CheckpointMetadata =
        serde_json::from_str(&fs::read_to_string(dir.join(METADATA_FILE))?)?;
    let config =
        TrainingConfig::load(dir.join(CONFIG_FILE)).map_err(|e| NeuralSdfError::InvalidConfig {
            message: format!("{:?}", e),
        })?;

    let model = AutoDecoder::new(decoder_config, &config, metadata.num_shapes, device)?
        .load_file(dir.join(MODEL_STEM), &recorder(), device)
        .map_err(|e| NeuralSdfError::Record {
            message: format!("{:?}", e),
        })?;

    log::info!(
        "Loaded checkpoint from {:?} (epoch {}, {} shapes)",
        dir,
        metadata.epoch,
        metadata.num_shapes
    );

    Ok((model, config, metadata))
}

/// Check if a valid checkpoint exists at the given path.
pub fn checkpoint_exists(dir: &Path) -> bool {
    dir.join(METADATA_FILE).exists() && dir.join(CONFIG_FILE).exists() && dir.join(MODEL_FILE).exists()
}

/// Get the latest checkpoint from a series of numbered checkpoints.
///
/// Looks for directories named `checkpoint_N` where N is an epoch number.
pub fn find_latest_checkpoint(base_dir: &Path) -> Option<PathBuf> {
    fs::read_dir(base_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && checkpoint_exists(path))
        .filter_map(|path| {
            let epoch = path
                .file_name()?
                .to_str()?
                .strip_prefix("checkpoint_")?
                .parse::<usize>()
                .ok()?;
            Some((epoch, path))
        })
        .max_by_key(|(epoch, _)| *epoch)
        .map(|(_, path)| path)
}

/// Write every shape's latent code to `<codes_dir>/<archive path>.npy`.
///
/// `entries` must be the dataset order the model was trained with.
pub fn export_latent_codes<B: Backend>(
    model: &AutoDecoder<B>,
    entries: &[ShapeEntry],
    codes_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if entries.len() != model.num_shapes() {
        return Err(NeuralSdfError::ShapeMismatch {
            expected: vec![model.num_shapes()],
            got: vec![entries.len()],
        });
    }

    let mut written = Vec::with_capacity(entries.len());
    for (shape, entry) in entries.iter().enumerate() {
        let path = latent_code_path(codes_dir, &entry.relative_path);
        save_latent_code(&path, &model.latent_code(shape)?)?;
        written.push(path);
    }

    log::info!("Exported {} latent codes to {:?}", written.len(), codes_dir);
    Ok(written)
}
