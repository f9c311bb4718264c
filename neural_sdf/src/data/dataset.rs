//! Indexed collection of shapes producing SDF training samples.

use std::borrow::Cow;
use std::path::PathBuf;

use ndarray::{concatenate, Array2, Axis};
use rand::Rng;
use sdf_io::{subsample, SampleStore, SdfSamples, ShapeEntry, SplitSpec, SAMPLE_COLUMNS};

use crate::config::{DatasetConfig, CLASS_EMBEDDING_WIDTH};
use crate::data::{one_hot, ClassEmbeddingTable};
use crate::error::{NeuralSdfError, Result};

/// Where sample data lives between accesses.
#[derive(Debug, Clone)]
pub enum Materialization {
    /// Cleaned, shuffled samples held in memory, one entry per shape.
    Eager(Vec<SdfSamples>),
    /// Samples read and cleaned from disk on every access.
    Lazy,
}

/// Shapes resolved from a split, served as `[M, F]` sample matrices.
///
/// Rows are `(x, y, z, sdf)`, followed by the 9-wide class one-hot when class
/// conditioning is enabled. The dataset is read-only after construction, so
/// `get` can be called from several threads at once.
#[derive(Debug, Clone)]
pub struct ShapeDataset {
    store: SampleStore,
    entries: Vec<ShapeEntry>,
    materialization: Materialization,
    config: DatasetConfig,
    class_table: Option<ClassEmbeddingTable>,
}

impl ShapeDataset {
    /// Resolve `split` under `data_root` and, with `load_ram`, load every archive.
    pub fn new(
        data_root: impl Into<PathBuf>,
        split: &SplitSpec,
        config: &DatasetConfig,
        class_table: Option<ClassEmbeddingTable>,
    ) -> Result<Self> {
        Self::new_with_rng(data_root, split, config, class_table, &mut rand::thread_rng())
    }

    /// Like [`ShapeDataset::new`] with an explicit RNG for the eager shuffle.
    pub fn new_with_rng<R: Rng + ?Sized>(
        data_root: impl Into<PathBuf>,
        split: &SplitSpec,
        config: &DatasetConfig,
        class_table: Option<ClassEmbeddingTable>,
        rng: &mut R,
    ) -> Result<Self> {
        if config.use_class_embedding && class_table.is_none() {
            return Err(NeuralSdfError::InvalidConfig {
                message: "class embedding requested without a class embedding table".to_string(),
            });
        }

        let store = SampleStore::new(data_root);
        let entries = store.resolve(split)?;

        let materialization = if config.load_ram {
            let samples = entries
                .iter()
                .map(|entry| Ok(store.load_clean(&entry.relative_path)?.shuffled(rng)))
                .collect::<Result<Vec<_>>>()?;
            Materialization::Eager(samples)
        } else {
            Materialization::Lazy
        };

        log::info!(
            "Dataset over {} with {} shapes ({})",
            store.data_root().display(),
            entries.len(),
            if config.load_ram { "eager" } else { "lazy" }
        );

        Ok(Self {
            store,
            entries,
            materialization,
            config: config.clone(),
            class_table,
        })
    }

    /// Number of resolved shapes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no shape resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolved shapes in split order.
    pub fn entries(&self) -> &[ShapeEntry] {
        &self.entries
    }

    /// The dataset configuration.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Column count of the matrices returned by [`ShapeDataset::get`].
    pub fn feature_width(&self) -> usize {
        if self.config.use_class_embedding {
            SAMPLE_COLUMNS + CLASS_EMBEDDING_WIDTH
        } else {
            SAMPLE_COLUMNS
        }
    }

    /// Samples of shape `index` with a fresh random subsample.
    pub fn get(&self, index: usize) -> Result<(Array2<f32>, usize)> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    /// Samples of shape `index`, drawing the subsample from `rng`.
    ///
    /// Returns the sample matrix together with `index`. Nothing is cached,
    /// so repeated calls give different subsamples.
    pub fn get_with_rng<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<(Array2<f32>, usize)> {
        let entry = self
            .entries
            .get(index)
            .ok_or(NeuralSdfError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })?;

        let samples: Cow<'_, SdfSamples> = match &self.materialization {
            Materialization::Eager(cache) => Cow::Borrowed(&cache[index]),
            Materialization::Lazy => Cow::Owned(self.store.load_clean(&entry.relative_path)?),
        };

        let rows = match self.config.subsample {
            Some(k) => subsample(&samples.positive, &samples.negative, k, rng)?,
            None => samples.concatenated()?,
        };

        if !self.config.use_class_embedding {
            return Ok((rows, index));
        }

        let table = self
            .class_table
            .as_ref()
            .ok_or_else(|| NeuralSdfError::InvalidConfig {
                message: "class embedding requested without a class embedding table".to_string(),
            })?;
        let class_index = table.index_of(&entry.class_name)?;
        Ok((append_class_columns(rows, class_index)?, index))
    }
}

/// Append the one-hot block of `class_index` to every row.
pub fn append_class_columns(rows: Array2<f32>, class_index: usize) -> Result<Array2<f32>> {
    let code = one_hot(class_index)?;
    let block = Array2::from_shape_fn((rows.nrows(), CLASS_EMBEDDING_WIDTH), |(_, c)| code[c]);

    concatenate(Axis(1), &[rows.view(), block.view()]).map_err(|e| NeuralSdfError::TensorData {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_shape(root: &std::path::Path, class: &str, instance: &str) {
        let path = root
            .join(sdf_io::SDF_SAMPLES_SUBDIR)
            .join("ShapeNet")
            .join(class)
            .join(format!("{}.npz", instance));
        let positive = array![[0.0f32, 0.0, 0.0, 0.1], [1.0, 1.0, 1.0, f32::NAN]];
        let negative = array![[0.5f32, 0.5, 0.5, -0.2], [0.2, 0.2, 0.2, -0.1]];
        sdf_io::save_archive(&path, &SdfSamples::new(positive, negative)).unwrap();
    }

    fn fixture() -> (TempDir, SplitSpec) {
        let dir = TempDir::new().unwrap();
        write_shape(dir.path(), "chair", "a");
        write_shape(dir.path(), "sofa", "b");
        let split = SplitSpec::new()
            .with_instances("ShapeNet", "chair", ["a"])
            .with_instances("ShapeNet", "sofa", ["b", "missing"]);
        (dir, split)
    }

    fn table() -> ClassEmbeddingTable {
        ClassEmbeddingTable::new(HashMap::from([
            ("chair".to_string(), 2),
            ("sofa".to_string(), 5),
        ]))
        .unwrap()
    }

    #[test]
    fn test_lazy_full_rows() {
        let (dir, split) = fixture();
        let dataset = ShapeDataset::new(dir.path(), &split, &DatasetConfig::new(), None).unwrap();

        assert_eq!(dataset.len(), 2);
        let (rows, index) = dataset.get(1).unwrap();
        assert_eq!(index, 1);
        // The NaN row is removed.
        assert_eq!(rows.dim(), (3, 4));
        assert!(rows.column(3).iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_eager_subsample_with_class() {
        let (dir, split) = fixture();
        let config = DatasetConfig::new()
            .with_subsample(Some(6))
            .with_load_ram(true)
            .with_use_class_embedding(true);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dataset =
            ShapeDataset::new_with_rng(dir.path(), &split, &config, Some(table()), &mut rng)
                .unwrap();

        let (rows, _) = dataset.get_with_rng(1, &mut rng).unwrap();
        assert_eq!(dataset.feature_width(), 13);
        assert_eq!(rows.dim(), (6, 13));
        for row in rows.outer_iter() {
            assert_eq!(row[4 + 5], 1.0);
            assert_eq!(row.iter().skip(4).sum::<f32>(), 1.0);
        }
        // Positive block first.
        assert!(rows.column(3).iter().take(3).all(|&d| d > 0.0));
        assert!(rows.column(3).iter().skip(3).all(|&d| d < 0.0));
    }

    #[test]
    fn test_odd_subsample_truncates() {
        let (dir, split) = fixture();
        let config = DatasetConfig::new().with_subsample(Some(5));
        let dataset = ShapeDataset::new(dir.path(), &split, &config, None).unwrap();

        let (rows, _) = dataset.get(0).unwrap();
        assert_eq!(rows.nrows(), 4);
    }

    #[test]
    fn test_index_out_of_range() {
        let (dir, split) = fixture();
        let dataset = ShapeDataset::new(dir.path(), &split, &DatasetConfig::new(), None).unwrap();

        assert!(matches!(
            dataset.get(2),
            Err(NeuralSdfError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_class_embedding_needs_table() {
        let (dir, split) = fixture();
        let config = DatasetConfig::new().with_use_class_embedding(true);

        assert!(matches!(
            ShapeDataset::new(dir.path(), &split, &config, None),
            Err(NeuralSdfError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_dataset_is_sync() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<ShapeDataset>();
    }
}
