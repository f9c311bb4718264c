//! Decoder and per-shape latent codes trained jointly.

use burn::module::Module;
use burn::nn::{Embedding, EmbeddingConfig, Initializer};
use burn::prelude::*;

use crate::config::{DecoderConfig, TrainingConfig};
use crate::error::{NeuralSdfError, Result};
use crate::nn::ConditionalDecoder;

/// Auto-decoder: a shared decoder plus one latent code per training shape.
#[derive(Module, Debug)]
pub struct AutoDecoder<B: Backend> {
    /// Shared decoder.
    pub decoder: ConditionalDecoder<B>,
    /// Latent code table, `[num_shapes, latent_size]`.
    pub latent_codes: Embedding<B>,
}

impl<B: Backend> AutoDecoder<B> {
    /// Create a model for `num_shapes` shapes.
    ///
    /// Codes are drawn from `N(0, code_init_std_dev / sqrt(latent_size))`.
    pub fn new(
        decoder_config: &DecoderConfig,
        training_config: &TrainingConfig,
        num_shapes: usize,
        device: &B::Device,
    ) -> Result<Self> {
        if num_shapes == 0 || decoder_config.latent_size == 0 {
            return Err(NeuralSdfError::InvalidConfig {
                message: format!(
                    "auto-decoder needs shapes and a latent code, got {} shapes of size {}",
                    num_shapes, decoder_config.latent_size
                ),
            });
        }

        let std = training_config.code_init_std_dev / (decoder_config.latent_size as f64).sqrt();
        let latent_codes = EmbeddingConfig::new(num_shapes, decoder_config.latent_size)
            .with_initializer(Initializer::Normal { mean: 0.0, std })
            .init(device);

        Ok(Self {
            decoder: decoder_config.init(device)?,
            latent_codes,
        })
    }

    /// Number of latent codes.
    pub fn num_shapes(&self) -> usize {
        self.latent_codes.weight.dims()[0]
    }

    /// Codes for `[rows]` shape indices, `[rows, latent_size]`.
    pub fn codes_for(&self, shape_indices: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        self.latent_codes.weight.val().select(0, shape_indices)
    }

    /// Latent code of one shape.
    pub fn latent_code(&self, shape: usize) -> Result<Vec<f32>> {
        let num_shapes = self.num_shapes();
        if shape >= num_shapes {
            return Err(NeuralSdfError::IndexOutOfRange {
                index: shape,
                len: num_shapes,
            });
        }

        let latent_size = self.decoder.latent_size();
        self.latent_codes
            .weight
            .val()
            .slice([shape..shape + 1, 0..latent_size])
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| NeuralSdfError::TensorData {
                message: format!("{:?}", e),
            })
    }

    /// Predicted distances for a batch: codes are gathered per row and
    /// prepended to the coordinate block.
    pub fn forward(&self, coords: Tensor<B, 2>, shape_indices: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        let codes = self.codes_for(shape_indices);
        self.decoder.forward(Tensor::cat(vec![codes, coords], 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_auto_decoder_forward() {
        let device = Default::default();
        let model = AutoDecoder::<TestBackend>::new(
            &DecoderConfig::new(8, vec![16, 16]),
            &TrainingConfig::new(),
            3,
            &device,
        )
        .unwrap();

        assert_eq!(model.num_shapes(), 3);
        assert_eq!(model.latent_code(2).unwrap().len(), 8);
        assert!(model.latent_code(3).is_err());

        let coords = Tensor::<TestBackend, 2>::zeros([5, 3], &device);
        let indices = Tensor::<TestBackend, 1, Int>::from_ints([0, 0, 1, 2, 2], &device);
        assert_eq!(model.forward(coords, indices).dims(), [5, 1]);
    }

    #[test]
    fn test_requires_shapes() {
        let device = Default::default();
        let result = AutoDecoder::<TestBackend>::new(
            &DecoderConfig::new(8, vec![16]),
            &TrainingConfig::new(),
            0,
            &device,
        );
        assert!(matches!(result, Err(NeuralSdfError::InvalidConfig { .. })));
    }
}
