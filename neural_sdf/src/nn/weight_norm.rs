//! Weight-normalized linear layer.

use burn::module::{Module, Param};
use burn::nn::LinearConfig;
use burn::prelude::*;

/// Linear layer with the weight split into direction and magnitude.
///
/// `W[:, j] = g[j] * v[:, j] / ||v[:, j]||`, one magnitude per output unit.
/// Weights use Burn's `[d_input, d_output]` layout.
#[derive(Module, Debug)]
pub struct WeightNormLinear<B: Backend> {
    /// Unnormalized direction `v`, `[d_input, d_output]`.
    direction: Param<Tensor<B, 2>>,
    /// Per-output magnitude `g`, `[d_output]`.
    magnitude: Param<Tensor<B, 1>>,
    /// Bias, `[d_output]`.
    bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> WeightNormLinear<B> {
    /// Create a layer whose initial effective weight equals a default linear init.
    pub fn new(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(d_input, d_output).init::<B>(device);
        let direction = linear.weight.val();
        let magnitude = column_norms(direction.clone()).reshape([d_output]);
        let bias = linear
            .bias
            .map(|bias| bias.val())
            .unwrap_or_else(|| Tensor::zeros([d_output], device));

        Self {
            direction: Param::from_tensor(direction),
            magnitude: Param::from_tensor(magnitude),
            bias: Param::from_tensor(bias),
        }
    }

    /// Effective weight `g * v / ||v||`.
    pub fn weight(&self) -> Tensor<B, 2> {
        let direction = self.direction.val();
        let norms = column_norms(direction.clone());
        let magnitude: Tensor<B, 2> = self.magnitude.val().unsqueeze();

        direction / norms * magnitude
    }

    /// Forward pass: `[batch, d_input] -> [batch, d_output]`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let bias: Tensor<B, 2> = self.bias.val().unsqueeze();
        x.matmul(self.weight()) + bias
    }

    /// Output width.
    pub fn d_output(&self) -> usize {
        self.magnitude.dims()[0]
    }
}

/// L2 norm of each column, `[1, d_output]`.
fn column_norms<B: Backend>(weight: Tensor<B, 2>) -> Tensor<B, 2> {
    weight.powf_scalar(2.0).sum_dim(0).sqrt().clamp_min(1e-12)
}
