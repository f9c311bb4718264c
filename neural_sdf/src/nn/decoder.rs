//! Class-conditioned auto-decoder.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::config::{
    DecoderConfig, TransformerLayerConfig, CLASS_EMBEDDING_WIDTH, LATENT_DROPOUT_PROB, XYZ_WIDTH,
};
use crate::error::{NeuralSdfError, Result};
use crate::nn::{TransformerLayer, WeightNormLinear};

/// The transform at one depth of the decoder.
#[derive(Module, Debug)]
pub enum LayerTransform<B: Backend> {
    /// Plain linear projection.
    Linear(Linear<B>),
    /// Weight-normalized linear projection.
    WeightNormed(WeightNormLinear<B>),
    /// Attention block of equal input and output width.
    Attention(TransformerLayer<B>),
}

impl<B: Backend> LayerTransform<B> {
    /// Apply the transform.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Self::Linear(linear) => linear.forward(x),
            Self::WeightNormed(linear) => linear.forward(x),
            Self::Attention(block) => block.forward(x),
        }
    }
}

/// One decoder depth: transform plus the flags resolved at construction.
#[derive(Module, Debug)]
pub struct DecoderLayer<B: Backend> {
    transform: LayerTransform<B>,
    norm: Option<LayerNorm<B>>,
    dropout: Option<Dropout>,
    /// Concatenate the original input before the transform.
    #[module(skip)]
    skip_input: bool,
}

impl<B: Backend> DecoderLayer<B> {
    /// The layer's transform.
    pub fn transform(&self) -> &LayerTransform<B> {
        &self.transform
    }

    /// Whether the original input is re-injected before this layer.
    pub fn has_skip_input(&self) -> bool {
        self.skip_input
    }

    /// Whether layer norm follows the transform.
    pub fn has_norm(&self) -> bool {
        self.norm.is_some()
    }

    /// Whether dropout follows the activation.
    pub fn has_dropout(&self) -> bool {
        self.dropout.is_some()
    }
}

/// Maps `[latent | xyz | class one-hot]` rows to signed distances.
///
/// The coordinate block is the trailing `xyz | one-hot` part of the input,
/// 3 columns wide or 12 with class conditioning. It is what `xyz_in_all`
/// re-injects and what latent dropout leaves untouched.
#[derive(Module, Debug)]
pub struct ConditionalDecoder<B: Backend> {
    layers: Vec<DecoderLayer<B>>,
    activation: Relu,
    latent_dropout: Option<Dropout>,
    #[module(skip)]
    use_tanh: bool,
    #[module(skip)]
    xyz_in_all: bool,
    #[module(skip)]
    latent_size: usize,
    #[module(skip)]
    coord_width: usize,
}

impl<B: Backend> ConditionalDecoder<B> {
    /// Build the decoder; fails before creating any module if the
    /// configuration is inconsistent.
    pub fn new(config: &DecoderConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;

        let dims = config.layer_dims();
        let num_transforms = config.num_transforms();
        let mut layers = Vec::with_capacity(num_transforms);

        for layer in 0..num_transforms {
            let in_width = dims[layer];
            let out_width = config.output_width(layer)?;
            let is_last = layer + 1 == num_transforms;
            let in_norm_set = config.norm_layers.contains(&layer);

            let transform = if config.is_attention_layer(layer) {
                LayerTransform::Attention(
                    TransformerLayerConfig::new(
                        in_width,
                        config.transformer_hidden_size,
                        config.num_heads,
                    )
                    .with_dropout(config.dropout_prob)
                    .init(device)?,
                )
            } else if config.weight_norm && in_norm_set {
                LayerTransform::WeightNormed(WeightNormLinear::new(in_width, out_width, device))
            } else {
                LayerTransform::Linear(LinearConfig::new(in_width, out_width).init(device))
            };

            let norm = (!is_last && in_norm_set && !config.weight_norm)
                .then(|| LayerNormConfig::new(out_width).init(device));
            let dropout = (!is_last && config.dropout.contains(&layer))
                .then(|| DropoutConfig::new(config.dropout_prob).init());

            layers.push(DecoderLayer {
                transform,
                norm,
                dropout,
                skip_input: config.latent_in.contains(&layer),
            });
        }

        let latent_dropout = config
            .latent_dropout
            .then(|| DropoutConfig::new(LATENT_DROPOUT_PROB).init());

        log::debug!(
            "Decoder with {} layers, input width {}, class conditioned: {}",
            layers.len(),
            dims[0],
            config.class_embedding
        );

        Ok(Self {
            layers,
            activation: Relu::new(),
            latent_dropout,
            use_tanh: config.use_tanh,
            xyz_in_all: config.xyz_in_all,
            latent_size: config.latent_size,
            coord_width: config.coord_width(),
        })
    }

    /// Forward pass: `[batch, input_width] -> [batch, 1]`.
    ///
    /// The output goes through tanh twice when `use_tanh` is set: once on
    /// the final layer and once as the closing stage, which is always applied.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [_, width] = input.dims();
        let latent_width = width.saturating_sub(self.coord_width);
        let coords = input.clone().narrow(1, latent_width, width - latent_width);

        let mut x = match &self.latent_dropout {
            Some(dropout) if latent_width > 0 => {
                let latent = input.clone().narrow(1, 0, latent_width);
                Tensor::cat(vec![dropout.forward(latent), coords.clone()], 1)
            }
            _ => input.clone(),
        };

        let last = self.layers.len() - 1;
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.skip_input {
                x = Tensor::cat(vec![x, input.clone()], 1);
            } else if self.xyz_in_all && index != 0 {
                x = Tensor::cat(vec![x, coords.clone()], 1);
            }

            x = layer.transform.forward(x);

            if index == last {
                if self.use_tanh {
                    x = x.tanh();
                }
                continue;
            }

            if let Some(norm) = &layer.norm {
                x = norm.forward(x);
            }
            x = self.activation.forward(x);
            if let Some(dropout) = &layer.dropout {
                x = dropout.forward(x);
            }
        }

        x.tanh()
    }

    /// Evaluate query points of a single shape.
    ///
    /// `latent` is `[latent_size]`, `class_embedding` the `[9]` one-hot when
    /// the decoder is class conditioned, and `xyz` is `[num_points, 3]`.
    /// Returns `[num_points, 1]`.
    pub fn query(
        &self,
        latent: Tensor<B, 1>,
        class_embedding: Option<Tensor<B, 1>>,
        xyz: Tensor<B, 2>,
    ) -> Result<Tensor<B, 2>> {
        let [num_points, xyz_width] = xyz.dims();
        if xyz_width != XYZ_WIDTH {
            return Err(NeuralSdfError::ShapeMismatch {
                expected: vec![num_points, XYZ_WIDTH],
                got: vec![num_points, xyz_width],
            });
        }
        let [latent_width] = latent.dims();
        if latent_width != self.latent_size {
            return Err(NeuralSdfError::ShapeMismatch {
                expected: vec![self.latent_size],
                got: vec![latent_width],
            });
        }

        let mut columns = vec![broadcast_rows(latent, num_points), xyz];
        match (class_embedding, self.class_conditioned()) {
            (Some(embedding), true) => {
                let [embedding_width] = embedding.dims();
                if embedding_width != CLASS_EMBEDDING_WIDTH {
                    return Err(NeuralSdfError::ShapeMismatch {
                        expected: vec![CLASS_EMBEDDING_WIDTH],
                        got: vec![embedding_width],
                    });
                }
                columns.push(broadcast_rows(embedding, num_points));
            }
            (None, false) => {}
            (Some(_), false) => {
                return Err(NeuralSdfError::InvalidConfig {
                    message: "class embedding given to an unconditioned decoder".to_string(),
                })
            }
            (None, true) => {
                return Err(NeuralSdfError::InvalidConfig {
                    message: "class conditioned decoder needs a class embedding".to_string(),
                })
            }
        }

        Ok(self.forward(Tensor::cat(columns, 1)))
    }

    /// Width of an input row.
    pub fn input_width(&self) -> usize {
        self.latent_size + self.coord_width
    }

    /// Latent code length.
    pub fn latent_size(&self) -> usize {
        self.latent_size
    }

    /// Width of the coordinate block.
    pub fn coord_width(&self) -> usize {
        self.coord_width
    }

    /// True when the input carries a class one-hot.
    pub fn class_conditioned(&self) -> bool {
        self.coord_width == XYZ_WIDTH + CLASS_EMBEDDING_WIDTH
    }

    /// Layers in evaluation order.
    pub fn layers(&self) -> &[DecoderLayer<B>] {
        &self.layers
    }
}

/// Repeat a vector as `rows` identical rows.
fn broadcast_rows<B: Backend>(vector: Tensor<B, 1>, rows: usize) -> Tensor<B, 2> {
    let row: Tensor<B, 2> = vector.unsqueeze();
    row.repeat_dim(0, rows)
}
