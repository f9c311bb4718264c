//! Auto-decoder trainer.

use burn::nn::Embedding;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{DecoderConfig, TrainingConfig};
use crate::data::ShapeDataset;
use crate::error::{NeuralSdfError, Result};
use crate::loss::{code_regularization, SdfLoss};
use crate::nn::ConditionalDecoder;

use super::batch::SdfBatch;
use super::metrics::TrainMetrics;
use super::model::AutoDecoder;

/// Jointly optimizes decoder weights and per-shape latent codes.
///
/// Decoder and codes have separate Adam optimizers so they can use
/// different learning rates.
pub struct AutoDecoderTrainer<B: AutodiffBackend> {
    model: AutoDecoder<B>,
    decoder_optim: OptimizerAdaptor<Adam, ConditionalDecoder<B>, B>,
    code_optim: OptimizerAdaptor<Adam, Embedding<B>, B>,
    loss: SdfLoss,
    config: TrainingConfig,
    device: B::Device,
    epoch: usize,
}

impl<B: AutodiffBackend> AutoDecoderTrainer<B> {
    /// Create a trainer with a fresh model for `num_shapes` shapes.
    pub fn new(
        decoder_config: &DecoderConfig,
        config: TrainingConfig,
        num_shapes: usize,
        device: &B::Device,
    ) -> Result<Self> {
        let model = AutoDecoder::new(decoder_config, &config, num_shapes, device)?;
        Self::from_model(model, config, device)
    }

    /// Create a trainer around an existing model, such as a loaded checkpoint.
    pub fn from_model(
        model: AutoDecoder<B>,
        config: TrainingConfig,
        device: &B::Device,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            model,
            decoder_optim: AdamConfig::new().init(),
            code_optim: AdamConfig::new().init(),
            loss: SdfLoss::new(config.clamp_distance),
            config,
            device: device.clone(),
            epoch: 0,
        })
    }

    /// The model being trained.
    pub fn model(&self) -> &AutoDecoder<B> {
        &self.model
    }

    /// Consume the trainer and return the model.
    pub fn into_model(self) -> AutoDecoder<B> {
        self.model
    }

    /// Training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Epochs completed so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// One optimization step on a batch.
    pub fn train_step(&mut self, batch: &SdfBatch<B>) -> Result<TrainMetrics> {
        let [_, coord_width] = batch.coords.dims();
        if coord_width != self.model.decoder.coord_width() {
            return Err(NeuralSdfError::ShapeMismatch {
                expected: vec![self.model.decoder.coord_width()],
                got: vec![coord_width],
            });
        }

        let codes = self.model.codes_for(batch.shape_indices.clone());
        let input = Tensor::cat(vec![codes.clone(), batch.coords.clone()], 1);
        let pred = self.model.decoder.forward(input);

        let sdf_loss = self.loss.forward(pred, batch.sdf.clone());
        let weight = self.config.code_regularization_weight(self.epoch);
        let regularization = (weight > 0.0).then(|| code_regularization(codes, weight));

        let sdf_value: f32 = sdf_loss.clone().into_scalar().elem();
        let regularization_value: f32 = regularization
            .as_ref()
            .map_or(0.0, |r| r.clone().into_scalar().elem());

        let total = match regularization {
            Some(regularization) => sdf_loss + regularization,
            None => sdf_loss,
        };

        let mut grads = total.backward();
        let decoder_grads = GradientsParams::from_module(&mut grads, &self.model.decoder);
        let code_grads = GradientsParams::from_module(&mut grads, &self.model.latent_codes);

        self.model.decoder = self.decoder_optim.step(
            self.config.decoder_learning_rate,
            self.model.decoder.clone(),
            decoder_grads,
        );
        self.model.latent_codes = self.code_optim.step(
            self.config.code_learning_rate,
            self.model.latent_codes.clone(),
            code_grads,
        );

        Ok(TrainMetrics::new(sdf_value, regularization_value))
    }

    /// One pass over the dataset in random shape order.
    ///
    /// Returns the mean of the step metrics.
    pub fn train_epoch<R: Rng + ?Sized>(
        &mut self,
        dataset: &ShapeDataset,
        rng: &mut R,
    ) -> Result<TrainMetrics> {
        if dataset.len() != self.model.num_shapes() {
            return Err(NeuralSdfError::ShapeMismatch {
                expected: vec![self.model.num_shapes()],
                got: vec![dataset.len()],
            });
        }

        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(rng);

        let mut steps = Vec::with_capacity(order.len().div_ceil(self.config.scenes_per_batch));
        for chunk in order.chunks(self.config.scenes_per_batch) {
            let samples = chunk
                .iter()
                .map(|&index| dataset.get_with_rng(index, rng))
                .collect::<Result<Vec<_>>>()?;
            let batch = SdfBatch::collate(&samples, &self.device)?;
            steps.push(self.train_step(&batch)?);
        }

        self.epoch += 1;
        Ok(TrainMetrics::mean(&steps))
    }

    /// Run `num_epochs` epochs and return the per-epoch metrics.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        dataset: &ShapeDataset,
        rng: &mut R,
    ) -> Result<Vec<TrainMetrics>> {
        let mut history = Vec::with_capacity(self.config.num_epochs);

        for _ in 0..self.config.num_epochs {
            let metrics = self.train_epoch(dataset, rng)?;
            if self.epoch % self.config.log_interval == 0 {
                log::info!(
                    "Epoch {}: loss {:.6} (sdf {:.6}, code {:.6})",
                    self.epoch,
                    metrics.total_loss,
                    metrics.sdf_loss,
                    metrics.regularization_loss
                );
            }
            history.push(metrics);
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn batch(device: &<TestBackend as Backend>::Device) -> SdfBatch<TestBackend> {
        SdfBatch {
            coords: Tensor::from_floats(
                [[0.1, 0.2, 0.3], [-0.4, 0.1, 0.0], [0.3, -0.3, 0.2], [0.0, 0.0, 0.5]],
                device,
            ),
            sdf: Tensor::from_floats([[0.05], [-0.02], [0.08], [-0.06]], device),
            shape_indices: Tensor::from_ints([0, 0, 1, 1], device),
        }
    }

    #[test]
    fn test_train_step_updates_codes() {
        let device = Default::default();
        let mut trainer = AutoDecoderTrainer::<TestBackend>::new(
            &DecoderConfig::new(4, vec![16, 16]),
            TrainingConfig::new().with_code_regularization_ramp(0),
            2,
            &device,
        )
        .unwrap();
        let before = trainer.model().latent_code(0).unwrap();

        let metrics = trainer.train_step(&batch(&device)).unwrap();
        assert!(metrics.total_loss.is_finite());
        assert!(metrics.regularization_loss > 0.0);

        let after = trainer.model().latent_code(0).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_rejects_mismatched_coords() {
        let device = Default::default();
        let mut trainer = AutoDecoderTrainer::<TestBackend>::new(
            &DecoderConfig::new(4, vec![16]).with_class_embedding(true),
            TrainingConfig::new(),
            2,
            &device,
        )
        .unwrap();

        assert!(matches!(
            trainer.train_step(&batch(&device)),
            Err(NeuralSdfError::ShapeMismatch { .. })
        ));
    }
}
