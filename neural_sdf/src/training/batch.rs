//! Collation of dataset samples into training batches.

use burn::prelude::*;
use ndarray::Array2;
use sdf_io::{SAMPLE_COLUMNS, SDF_COLUMN};

use crate::error::{NeuralSdfError, Result};

/// A batch of SDF samples from several shapes.
#[derive(Debug, Clone)]
pub struct SdfBatch<B: Backend> {
    /// Coordinate block per row: xyz, then the class one-hot if present.
    pub coords: Tensor<B, 2>,
    /// Ground-truth distance per row, `[rows, 1]`.
    pub sdf: Tensor<B, 2>,
    /// Shape index per row.
    pub shape_indices: Tensor<B, 1, Int>,
}

impl<B: Backend> SdfBatch<B> {
    /// Stack `(samples, shape index)` pairs as returned by
    /// [`ShapeDataset::get`](crate::data::ShapeDataset::get).
    ///
    /// Shapes may contribute different row counts.
    pub fn collate(samples: &[(Array2<f32>, usize)], device: &B::Device) -> Result<Self> {
        let width = samples
            .first()
            .map(|(rows, _)| rows.ncols())
            .unwrap_or(SAMPLE_COLUMNS);
        if width < SAMPLE_COLUMNS {
            return Err(NeuralSdfError::ShapeMismatch {
                expected: vec![SAMPLE_COLUMNS],
                got: vec![width],
            });
        }

        let coord_width = width - 1;
        let mut coords = Vec::new();
        let mut sdf = Vec::new();
        let mut shape_indices = Vec::new();

        for (rows, shape) in samples {
            if rows.ncols() != width {
                return Err(NeuralSdfError::ShapeMismatch {
                    expected: vec![rows.nrows(), width],
                    got: vec![rows.nrows(), rows.ncols()],
                });
            }
            for row in rows.outer_iter() {
                coords.extend(
                    row.iter()
                        .enumerate()
                        .filter(|&(column, _)| column != SDF_COLUMN)
                        .map(|(_, &value)| value),
                );
                sdf.push(row[SDF_COLUMN]);
                shape_indices.push(*shape as i64);
            }
        }

        let num_rows = sdf.len();
        if num_rows == 0 {
            return Err(NeuralSdfError::InvalidConfig {
                message: "batch has no sample rows".to_string(),
            });
        }

        Ok(Self {
            coords: Tensor::<B, 1>::from_data(coords.as_slice(), device)
                .reshape([num_rows, coord_width]),
            sdf: Tensor::<B, 1>::from_data(sdf.as_slice(), device).reshape([num_rows, 1]),
            shape_indices: Tensor::<B, 1, Int>::from_data(shape_indices.as_slice(), device),
        })
    }

    /// Number of sample rows.
    pub fn num_rows(&self) -> usize {
        self.sdf.dims()[0]
    }

    /// Get the device of this batch.
    pub fn device(&self) -> B::Device {
        self.sdf.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::array;

    type TestBackend = NdArray;

    #[test]
    fn test_collate_uneven_shapes() {
        let device = Default::default();
        let samples = vec![
            (array![[0.0f32, 0.1, 0.2, 0.05], [1.0, 1.1, 1.2, -0.05]], 4),
            (array![[2.0f32, 2.1, 2.2, 0.01]], 7),
        ];

        let batch = SdfBatch::<TestBackend>::collate(&samples, &device).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.coords.dims(), [3, 3]);

        let sdf: Vec<f32> = batch.sdf.to_data().to_vec().unwrap();
        assert_eq!(sdf, vec![0.05, -0.05, 0.01]);
        let coords: Vec<f32> = batch.coords.to_data().to_vec().unwrap();
        assert_eq!(&coords[6..], &[2.0, 2.1, 2.2]);
        let indices: Vec<i64> = batch.shape_indices.to_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(indices, vec![4, 4, 7]);
    }

    #[test]
    fn test_collate_keeps_class_columns() {
        let device = Default::default();
        let mut row = vec![0.5f32, 0.5, 0.5, -0.1];
        row.extend([0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let samples = vec![(Array2::from_shape_vec((1, 13), row).unwrap(), 0)];

        let batch = SdfBatch::<TestBackend>::collate(&samples, &device).unwrap();
        assert_eq!(batch.coords.dims(), [1, 12]);
    }

    #[test]
    fn test_collate_empty() {
        let device = Default::default();
        let samples = vec![(Array2::<f32>::zeros((0, 4)), 0)];
        assert!(SdfBatch::<TestBackend>::collate(&samples, &device).is_err());
    }
}
