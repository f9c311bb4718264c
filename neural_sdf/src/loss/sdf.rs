//! SDF regression loss.

use burn::prelude::*;

/// Clamped L1 loss between predicted and ground-truth signed distances.
///
/// Both sides are clamped to `[-delta, delta]` so the network spends its
/// capacity near the surface.
#[derive(Debug, Clone, Copy)]
pub struct SdfLoss {
    clamp_distance: f32,
}

impl SdfLoss {
    /// Create a loss with clamp distance `delta`.
    pub fn new(clamp_distance: f32) -> Self {
        Self { clamp_distance }
    }

    /// The clamp distance.
    pub fn clamp_distance(&self) -> f32 {
        self.clamp_distance
    }

    /// `mean(|clamp(pred) - clamp(target)|)` over `[rows, 1]` inputs.
    pub fn forward<B: Backend>(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        let delta = self.clamp_distance;
        let pred = pred.clamp(-delta, delta);
        let target = target.clamp(-delta, delta);

        (pred - target).abs().mean()
    }
}
