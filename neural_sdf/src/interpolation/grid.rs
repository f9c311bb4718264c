//! Dense evaluation of a decoder over the reconstruction cube.

use burn::prelude::*;

use crate::error::{NeuralSdfError, Result};
use crate::nn::ConditionalDecoder;

/// Lower corner of the `[-1, 1]^3` reconstruction cube.
pub const VOXEL_ORIGIN: [f32; 3] = [-1.0, -1.0, -1.0];

/// Edge length of a voxel at `resolution` samples per axis.
pub fn voxel_size(resolution: usize) -> f32 {
    2.0 / (resolution.max(2) - 1) as f32
}

/// Position of grid sample `index`; `z` varies fastest, then `y`, then `x`.
pub fn grid_point(index: usize, resolution: usize) -> [f32; 3] {
    let size = voxel_size(resolution);
    let z = index % resolution;
    let y = (index / resolution) % resolution;
    let x = index / (resolution * resolution);

    [
        VOXEL_ORIGIN[0] + x as f32 * size,
        VOXEL_ORIGIN[1] + y as f32 * size,
        VOXEL_ORIGIN[2] + z as f32 * size,
    ]
}

/// Signed distances at every sample of a `resolution^3` grid.
///
/// Points are evaluated in chunks of at most `max_batch`. Values follow
/// [`grid_point`] order.
pub fn evaluate_grid<B: Backend>(
    decoder: &ConditionalDecoder<B>,
    latent: &[f32],
    class_embedding: Option<&[f32]>,
    resolution: usize,
    max_batch: usize,
    device: &B::Device,
) -> Result<Vec<f32>> {
    if resolution < 2 || max_batch == 0 {
        return Err(NeuralSdfError::InvalidConfig {
            message: format!(
                "grid resolution {} and max batch {} must be at least 2 and 1",
                resolution, max_batch
            ),
        });
    }

    let total = resolution.pow(3);
    let latent = Tensor::<B, 1>::from_data(latent, device);
    let class_embedding = class_embedding.map(|e| Tensor::<B, 1>::from_data(e, device));

    let mut values = Vec::with_capacity(total);
    let mut start = 0;
    while start < total {
        let end = (start + max_batch).min(total);
        let coords: Vec<f32> = (start..end)
            .flat_map(|index| grid_point(index, resolution))
            .collect();
        let xyz = Tensor::<B, 1>::from_data(coords.as_slice(), device).reshape([end - start, 3]);

        let sdf = decoder.query(latent.clone(), class_embedding.clone(), xyz)?;
        let chunk = sdf
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| NeuralSdfError::TensorData {
                message: format!("{:?}", e),
            })?;
        values.extend(chunk);
        start = end;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_grid_corners() {
        assert_eq!(grid_point(0, 3), [-1.0, -1.0, -1.0]);
        assert_eq!(grid_point(2, 3), [-1.0, -1.0, 1.0]);
        assert_eq!(grid_point(3, 3), [-1.0, 0.0, -1.0]);
        assert_eq!(grid_point(26, 3), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_chunked_matches_single_batch() {
        let device = Default::default();
        let decoder = DecoderConfig::new(4, vec![8, 8])
            .init::<TestBackend>(&device)
            .unwrap();
        let latent = [0.1f32, -0.2, 0.3, 0.0];

        let whole = evaluate_grid(&decoder, &latent, None, 3, 1 << 18, &device).unwrap();
        let chunked = evaluate_grid(&decoder, &latent, None, 3, 5, &device).unwrap();

        assert_eq!(whole.len(), 27);
        for (a, b) in whole.iter().zip(&chunked) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_invalid_grid() {
        let device = Default::default();
        let decoder = DecoderConfig::new(2, vec![4])
            .init::<TestBackend>(&device)
            .unwrap();
        assert!(evaluate_grid(&decoder, &[0.0, 0.0], None, 1, 16, &device).is_err());
        assert!(evaluate_grid(&decoder, &[0.0, 0.0], None, 4, 0, &device).is_err());
    }
}
