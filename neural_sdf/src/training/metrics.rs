//! Training metrics.

use serde::{Deserialize, Serialize};

/// Loss components of a training step or the mean over an epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainMetrics {
    /// Clamped L1 distance loss.
    pub sdf_loss: f32,
    /// Weighted latent code regularization.
    pub regularization_loss: f32,
    /// Sum of both components.
    pub total_loss: f32,
}

impl TrainMetrics {
    /// Create metrics from the two loss components.
    pub fn new(sdf_loss: f32, regularization_loss: f32) -> Self {
        Self {
            sdf_loss,
            regularization_loss,
            total_loss: sdf_loss + regularization_loss,
        }
    }

    /// Component-wise mean of several steps.
    pub fn mean(steps: &[TrainMetrics]) -> Self {
        if steps.is_empty() {
            return Self::default();
        }
        let n = steps.len() as f32;
        Self::new(
            steps.iter().map(|m| m.sdf_loss).sum::<f32>() / n,
            steps.iter().map(|m| m.regularization_loss).sum::<f32>() / n,
        )
    }
}
