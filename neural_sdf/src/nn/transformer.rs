//! Attention block used in place of a linear layer.

use burn::module::Module;
use burn::nn::attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::config::TransformerLayerConfig;
use crate::error::{NeuralSdfError, Result};

/// Post-norm transformer encoder layer over a singleton sequence.
///
/// Every row of the batch is its own length-1 sequence, so attention only
/// re-weights the row's own features and never mixes examples.
#[derive(Module, Debug)]
pub struct TransformerLayer<B: Backend> {
    attention: MultiHeadAttention<B>,
    norm: LayerNorm<B>,
    ff_in: Linear<B>,
    activation: Relu,
    dropout: Dropout,
    ff_out: Linear<B>,
    norm_output: LayerNorm<B>,
}

impl<B: Backend> TransformerLayer<B> {
    /// Create an attention block from configuration.
    pub fn new(config: &TransformerLayerConfig, device: &B::Device) -> Result<Self> {
        if config.n_heads == 0 || config.d_model % config.n_heads != 0 {
            return Err(NeuralSdfError::InvalidConfig {
                message: format!(
                    "attention width {} is not divisible by {} heads",
                    config.d_model, config.n_heads
                ),
            });
        }

        Ok(Self {
            attention: MultiHeadAttentionConfig::new(config.d_model, config.n_heads)
                .with_dropout(config.dropout)
                .init(device),
            norm: LayerNormConfig::new(config.d_model).init(device),
            ff_in: LinearConfig::new(config.d_model, config.d_hidden).init(device),
            activation: Relu::new(),
            dropout: DropoutConfig::new(config.dropout).init(),
            ff_out: LinearConfig::new(config.d_hidden, config.d_model).init(device),
            norm_output: LayerNormConfig::new(config.d_model).init(device),
        })
    }

    /// Forward pass: `[batch, d_model] -> [batch, d_model]`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, d_model] = x.dims();

        let sequence: Tensor<B, 3> = x.clone().unsqueeze_dim(1);
        let attended = self
            .attention
            .forward(MhaInput::self_attn(sequence))
            .context
            .reshape([batch, d_model]);
        let x = self.norm.forward(x + attended);

        // Dropout sits inside the feed-forward sub-layer only; residuals are kept whole.
        let hidden = self.activation.forward(self.ff_in.forward(x.clone()));
        let hidden = self.ff_out.forward(self.dropout.forward(hidden));
        self.norm_output.forward(x + hidden)
    }
}
