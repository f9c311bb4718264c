//! Dataset, training and reconstruction configuration types.

use burn::config::Config;

use crate::error::NeuralSdfError;

/// Configuration for a [`ShapeDataset`](crate::data::ShapeDataset).
#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Rows per access; `None` returns every cleaned row.
    #[config(default = "None")]
    pub subsample: Option<usize>,

    /// Load, clean and shuffle every archive once at construction.
    #[config(default = false)]
    pub load_ram: bool,

    /// Append the one-hot class embedding to every row.
    #[config(default = false)]
    pub use_class_embedding: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for auto-decoder training.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Learning rate of the decoder weights.
    #[config(default = 5e-4)]
    pub decoder_learning_rate: f64,

    /// Learning rate of the latent codes.
    #[config(default = 1e-3)]
    pub code_learning_rate: f64,

    /// Distances are clamped to `[-delta, delta]` before the L1 loss.
    #[config(default = 0.1)]
    pub clamp_distance: f32,

    /// Penalize latent code magnitude.
    #[config(default = true)]
    pub code_regularization: bool,

    /// Weight of the latent code penalty.
    #[config(default = 1e-4)]
    pub code_regularization_lambda: f32,

    /// Epochs over which the code penalty ramps up to full weight.
    #[config(default = 100)]
    pub code_regularization_ramp: usize,

    /// Shapes per optimization step.
    #[config(default = 64)]
    pub scenes_per_batch: usize,

    /// Number of epochs run by `train`.
    #[config(default = 2000)]
    pub num_epochs: usize,

    /// Log every `log_interval` epochs.
    #[config(default = 10)]
    pub log_interval: usize,

    /// Standard deviation of the initial latent codes, before scaling by
    /// `1 / sqrt(latent_size)`.
    #[config(default = 1.0)]
    pub code_init_std_dev: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.decoder_learning_rate <= 0.0 || self.code_learning_rate <= 0.0 {
            return Err(invalid("learning rates must be positive"));
        }
        if self.clamp_distance <= 0.0 {
            return Err(invalid("clamp_distance must be positive"));
        }
        if self.scenes_per_batch == 0 {
            return Err(invalid("scenes_per_batch must be positive"));
        }
        if self.log_interval == 0 {
            return Err(invalid("log_interval must be positive"));
        }
        Ok(())
    }

    /// Weight of the code penalty at `epoch`, ramped linearly.
    pub fn code_regularization_weight(&self, epoch: usize) -> f32 {
        if !self.code_regularization {
            return 0.0;
        }
        let ramp = if self.code_regularization_ramp == 0 {
            1.0
        } else {
            (epoch as f32 / self.code_regularization_ramp as f32).min(1.0)
        };
        self.code_regularization_lambda * ramp
    }
}

/// Configuration for latent space interpolation.
#[derive(Config, Debug)]
pub struct InterpolationConfig {
    /// Meshes written per shape pair, both endpoints included.
    pub num_interpolations: usize,

    /// Grid resolution per axis handed to mesh extraction.
    #[config(default = 256)]
    pub resolution: usize,

    /// Maximum query points per decoder evaluation during mesh extraction.
    #[config(default = 262144)]
    pub max_batch: usize,
}

impl InterpolationConfig {
    /// Number of interpolation steps between the two endpoints.
    pub fn steps(&self) -> crate::error::Result<usize> {
        match self.num_interpolations.checked_sub(1) {
            Some(steps) if steps > 0 => Ok(steps),
            _ => Err(invalid("num_interpolations must be at least 2")),
        }
    }
}

fn invalid(message: &str) -> NeuralSdfError {
    NeuralSdfError::InvalidConfig {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_training_config() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scenes_per_batch, 64);
    }

    #[test]
    fn test_code_regularization_ramp() {
        let config = TrainingConfig::new().with_code_regularization_lambda(1e-2);

        assert_eq!(config.code_regularization_weight(0), 0.0);
        assert!((config.code_regularization_weight(50) - 5e-3).abs() < 1e-9);
        assert!((config.code_regularization_weight(500) - 1e-2).abs() < 1e-9);

        let off = config.with_code_regularization(false);
        assert_eq!(off.code_regularization_weight(500), 0.0);
    }

    #[test]
    fn test_invalid_training_config() {
        assert!(TrainingConfig::new().with_scenes_per_batch(0).validate().is_err());
        assert!(TrainingConfig::new().with_clamp_distance(0.0).validate().is_err());
    }

    #[test]
    fn test_interpolation_steps() {
        assert_eq!(InterpolationConfig::new(5).steps().unwrap(), 4);
        assert!(InterpolationConfig::new(1).steps().is_err());
        assert!(InterpolationConfig::new(0).steps().is_err());
        assert_eq!(InterpolationConfig::new(5).max_batch, 1 << 18);
    }

    #[test]
    fn test_configs_json_roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();

        let training = TrainingConfig::new()
            .with_num_epochs(12)
            .with_code_regularization_ramp(0);
        training.save(temp.path().join("training.json")).unwrap();
        let training = TrainingConfig::load(temp.path().join("training.json")).unwrap();
        assert_eq!(training.num_epochs, 12);
        assert_eq!(training.code_regularization_weight(0), 1e-4);

        let dataset = DatasetConfig::new().with_subsample(Some(64));
        dataset.save(temp.path().join("dataset.json")).unwrap();
        let dataset = DatasetConfig::load(temp.path().join("dataset.json")).unwrap();
        assert_eq!(dataset.subsample, Some(64));

        let interpolation = InterpolationConfig::new(4).with_resolution(32);
        interpolation.save(temp.path().join("interpolation.json")).unwrap();
        let interpolation =
            InterpolationConfig::load(temp.path().join("interpolation.json")).unwrap();
        assert_eq!(interpolation.steps().unwrap(), 3);
        assert_eq!(interpolation.resolution, 32);
    }

    #[test]
    fn test_dataset_config_builder() {
        let config = DatasetConfig::new()
            .with_subsample(Some(16384))
            .with_load_ram(true);
        assert_eq!(config.subsample, Some(16384));
        assert!(!config.use_class_embedding);
    }
}
