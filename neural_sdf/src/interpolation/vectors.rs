//! Linear blending of latent and class vectors.

use crate::error::{NeuralSdfError, Result};

/// Blend `a` into `b` over `steps` equal steps, both endpoints included.
///
/// Returns `steps + 1` vectors `v_j = a + j * (b - a) / steps`. The first is
/// exactly `a` and the last exactly `b`.
pub fn interpolate_vectors(a: &[f32], b: &[f32], steps: usize) -> Result<Vec<Vec<f32>>> {
    if a.len() != b.len() {
        return Err(NeuralSdfError::ShapeMismatch {
            expected: vec![a.len()],
            got: vec![b.len()],
        });
    }
    if steps == 0 {
        return Err(NeuralSdfError::InvalidConfig {
            message: "interpolation needs at least one step".to_string(),
        });
    }

    let mut vectors: Vec<Vec<f32>> = (0..steps)
        .map(|j| {
            a.iter()
                .zip(b)
                .map(|(&start, &end)| start + j as f32 * (end - start) / steps as f32)
                .collect()
        })
        .collect();
    vectors.push(b.to_vec());

    Ok(vectors)
}
