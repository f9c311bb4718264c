//! Decoder network configuration types.

use burn::config::Config;
use burn::prelude::Backend;

use crate::error::NeuralSdfError;
use crate::nn::{ConditionalDecoder, TransformerLayer};

/// Width of the one-hot class embedding appended to the coordinates.
pub const CLASS_EMBEDDING_WIDTH: usize = 9;

/// Width of a query coordinate.
pub const XYZ_WIDTH: usize = 3;

/// Dropout probability applied to the latent part of the input when
/// latent dropout is enabled.
pub const LATENT_DROPOUT_PROB: f64 = 0.2;

/// Configuration for the class-conditioned auto-decoder.
///
/// The network maps `[latent | xyz | class one-hot]` to a signed distance.
/// With class conditioning the one-hot block is treated as part of the
/// coordinate block, which is then 12 wide instead of 3.
#[derive(Config, Debug)]
pub struct DecoderConfig {
    /// Length of the per-shape latent code.
    pub latent_size: usize,

    /// Hidden layer widths.
    pub dims: Vec<usize>,

    /// Layer indices with dropout after the activation.
    #[config(default = "Vec::new()")]
    pub dropout: Vec<usize>,

    /// Dropout probability shared by all dropout layers and attention blocks.
    #[config(default = 0.0)]
    pub dropout_prob: f64,

    /// Layer indices with normalization.
    #[config(default = "Vec::new()")]
    pub norm_layers: Vec<usize>,

    /// Layer indices whose input is re-concatenated with the original input.
    #[config(default = "Vec::new()")]
    pub latent_in: Vec<usize>,

    /// Use weight normalization on `norm_layers` instead of layer norm.
    #[config(default = false)]
    pub weight_norm: bool,

    /// Concatenate the coordinate block into every hidden layer's input.
    #[config(default = false)]
    pub xyz_in_all: bool,

    /// Squash the final layer output with tanh.
    #[config(default = false)]
    pub use_tanh: bool,

    /// Apply dropout to the latent part of the input.
    #[config(default = false)]
    pub latent_dropout: bool,

    /// Append a one-hot class embedding to the coordinates.
    #[config(default = false)]
    pub class_embedding: bool,

    /// Replace every other linear layer with an attention block.
    #[config(default = false)]
    pub use_transformers: bool,

    /// Hidden width of the attention block's feed-forward sub-layer.
    #[config(default = 1024)]
    pub transformer_hidden_size: usize,

    /// Number of attention heads.
    #[config(default = 16)]
    pub num_heads: usize,
}

impl DecoderConfig {
    /// Width of the coordinate block: xyz plus the optional class one-hot.
    pub fn coord_width(&self) -> usize {
        if self.class_embedding {
            XYZ_WIDTH + CLASS_EMBEDDING_WIDTH
        } else {
            XYZ_WIDTH
        }
    }

    /// Width of a full input row.
    pub fn input_width(&self) -> usize {
        self.latent_size + self.coord_width()
    }

    /// Layer widths including the input row and the scalar output.
    pub fn layer_dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.dims.len() + 2);
        dims.push(self.input_width());
        dims.extend_from_slice(&self.dims);
        dims.push(1);
        dims
    }

    /// Number of transforms (linear or attention) in the network.
    pub fn num_transforms(&self) -> usize {
        self.dims.len() + 1
    }

    /// Whether layer `layer` is an attention block.
    ///
    /// Every second layer is, except the final projection to the scalar
    /// distance which always stays linear.
    pub fn is_attention_layer(&self, layer: usize) -> bool {
        self.use_transformers && (layer + 1) % 2 == 0 && layer + 1 < self.num_transforms()
    }

    /// Output width of transform `layer`.
    ///
    /// A layer feeding a skip connection shrinks by the input width so the
    /// concatenation restores `dims[layer + 1]`; with `xyz_in_all` hidden
    /// layers shrink by the coordinate width for the same reason.
    pub fn output_width(&self, layer: usize) -> crate::error::Result<usize> {
        let dims = self.layer_dims();
        let last = self.num_transforms() - 1;
        let target = dims[layer + 1];

        let shrink = if self.latent_in.contains(&(layer + 1)) {
            dims[0]
        } else if self.xyz_in_all && layer != last {
            self.coord_width()
        } else {
            0
        };

        match target.checked_sub(shrink) {
            Some(width) if width > 0 => Ok(width),
            _ => Err(NeuralSdfError::InvalidConfig {
                message: format!(
                    "layer {} output width {} - {} is not positive",
                    layer, target, shrink
                ),
            }),
        }
    }

    /// Check structural constraints before any module is created.
    pub fn validate(&self) -> crate::error::Result<()> {
        let num_transforms = self.num_transforms();

        if self.latent_size == 0 && self.latent_dropout {
            return Err(NeuralSdfError::InvalidConfig {
                message: "latent dropout needs a non-empty latent code".to_string(),
            });
        }
        if self.dims.iter().any(|&d| d == 0) {
            return Err(NeuralSdfError::InvalidConfig {
                message: "hidden layer widths must be positive".to_string(),
            });
        }
        for &layer in &self.latent_in {
            if layer == 0 || layer >= num_transforms {
                return Err(NeuralSdfError::InvalidConfig {
                    message: format!(
                        "latent_in layer {} must be in 1..{}",
                        layer, num_transforms
                    ),
                });
            }
        }
        if !(0.0..1.0).contains(&self.dropout_prob) {
            return Err(NeuralSdfError::InvalidConfig {
                message: format!("dropout_prob {} must be in [0, 1)", self.dropout_prob),
            });
        }
        let dims = self.layer_dims();
        for layer in 0..num_transforms {
            let out_width = self.output_width(layer)?;
            if !self.is_attention_layer(layer) {
                continue;
            }
            // The residual around the feed-forward sub-layer needs equal widths.
            if out_width != dims[layer] {
                return Err(NeuralSdfError::InvalidConfig {
                    message: format!(
                        "attention layer {} maps {} to {}, widths must match",
                        layer, dims[layer], out_width
                    ),
                });
            }
            if self.num_heads == 0 || dims[layer] % self.num_heads != 0 {
                return Err(NeuralSdfError::InvalidConfig {
                    message: format!(
                        "attention layer {} width {} is not divisible by {} heads",
                        layer, dims[layer], self.num_heads
                    ),
                });
            }
        }

        Ok(())
    }

    /// Initialize the decoder.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> crate::error::Result<ConditionalDecoder<B>> {
        ConditionalDecoder::new(self, device)
    }
}

/// Configuration for the attention block that stands in for a linear layer.
#[derive(Config, Debug)]
pub struct TransformerLayerConfig {
    /// Width of the block's input and output.
    pub d_model: usize,

    /// Hidden width of the feed-forward sub-layer.
    pub d_hidden: usize,

    /// Number of attention heads; must divide `d_model`.
    pub n_heads: usize,

    /// Dropout probability for attention weights and the feed-forward sub-layer.
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl TransformerLayerConfig {
    /// Initialize the attention block.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> crate::error::Result<TransformerLayer<B>> {
        TransformerLayer::new(self, device)
    }
}
