//! Per-shape SDF sample archives.
//!
//! An archive is an `.npz` file with two `N x 4` float arrays, `pos` and
//! `neg`, whose rows are `(x, y, z, sdf)`. Samples are partitioned by the sign
//! of their distance when the archive is written.

use std::fs::{self, File};
use std::path::Path;

use ndarray::{concatenate, Array2, Axis, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{NEGATIVE_KEY, POSITIVE_KEY, SAMPLE_COLUMNS, SDF_COLUMN};
use crate::error::{Result, SdfIoError};

/// Positive and negative sample groups of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfSamples {
    /// Samples outside the surface, `[N_p, 4]`.
    pub positive: Array2<f32>,
    /// Samples inside the surface, `[N_n, 4]`.
    pub negative: Array2<f32>,
}

impl SdfSamples {
    /// Create from the two sample groups.
    pub fn new(positive: Array2<f32>, negative: Array2<f32>) -> Self {
        Self { positive, negative }
    }

    /// Total number of rows across both groups.
    pub fn len(&self) -> usize {
        self.positive.nrows() + self.negative.nrows()
    }

    /// True when both groups are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop rows with a NaN distance from both groups independently.
    pub fn without_nans(&self) -> Self {
        Self {
            positive: remove_nans(&self.positive),
            negative: remove_nans(&self.negative),
        }
    }

    /// Shuffle the rows of each group independently.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self {
            positive: shuffle_rows(&self.positive, rng),
            negative: shuffle_rows(&self.negative, rng),
        }
    }

    /// All rows, positive block first.
    pub fn concatenated(&self) -> Result<Array2<f32>> {
        stack_groups(&self.positive, &self.negative)
    }
}

/// Read both sample groups from an archive as stored.
pub fn load_raw(path: &Path) -> Result<SdfSamples> {
    if !path.is_file() {
        return Err(SdfIoError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut npz = NpzReader::new(File::open(path)?)?;
    let names = npz.names()?;

    let positive = read_group(&mut npz, &names, POSITIVE_KEY, path)?;
    let negative = read_group(&mut npz, &names, NEGATIVE_KEY, path)?;

    Ok(SdfSamples { positive, negative })
}

/// Read an archive and drop rows whose distance is NaN.
///
/// Deterministic: loading the same archive twice gives identical arrays.
pub fn load_clean(path: &Path) -> Result<SdfSamples> {
    Ok(load_raw(path)?.without_nans())
}

/// Write an archive in the layout [`load_raw`] reads.
pub fn save_archive(path: &Path, samples: &SdfSamples) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array(POSITIVE_KEY, &samples.positive)?;
    npz.add_array(NEGATIVE_KEY, &samples.negative)?;
    npz.finish()?;

    Ok(())
}

/// Keep only rows whose distance column is not NaN.
pub fn remove_nans(samples: &Array2<f32>) -> Array2<f32> {
    let keep: Vec<usize> = samples
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| row.get(SDF_COLUMN).map_or(true, |sdf| !sdf.is_nan()))
        .map(|(index, _)| index)
        .collect();

    samples.select(Axis(0), &keep)
}

/// Random permutation of the rows.
pub fn shuffle_rows<R: Rng + ?Sized>(samples: &Array2<f32>, rng: &mut R) -> Array2<f32> {
    let mut order: Vec<usize> = (0..samples.nrows()).collect();
    order.shuffle(rng);
    samples.select(Axis(0), &order)
}

/// Draw a balanced subsample of `2 * floor(k / 2)` rows.
///
/// `floor(k / 2)` rows are drawn uniformly with replacement from each group,
/// positive block first. An odd `k` loses one row to the integer division.
/// An empty group contributes an empty block, so the result is shorter than
/// requested rather than an error.
pub fn subsample<R: Rng + ?Sized>(
    positive: &Array2<f32>,
    negative: &Array2<f32>,
    k: usize,
    rng: &mut R,
) -> Result<Array2<f32>> {
    let half = k / 2;

    let positive = draw_rows(positive, half, rng, POSITIVE_KEY);
    let negative = draw_rows(negative, half, rng, NEGATIVE_KEY);

    stack_groups(&positive, &negative)
}

fn draw_rows<R: Rng + ?Sized>(
    samples: &Array2<f32>,
    count: usize,
    rng: &mut R,
    group: &str,
) -> Array2<f32> {
    let rows = samples.nrows();
    if rows == 0 {
        if count > 0 {
            log::warn!(
                "Sample group '{}' is empty, subsample will have {} fewer rows",
                group,
                count
            );
        }
        return Array2::zeros((0, samples.ncols()));
    }

    let indices: Vec<usize> = (0..count).map(|_| rng.gen_range(0..rows)).collect();
    samples.select(Axis(0), &indices)
}

fn stack_groups(positive: &Array2<f32>, negative: &Array2<f32>) -> Result<Array2<f32>> {
    if positive.ncols() != negative.ncols() {
        return Err(SdfIoError::ColumnMismatch {
            positive: positive.ncols(),
            negative: negative.ncols(),
        });
    }

    concatenate(Axis(0), &[positive.view(), negative.view()]).map_err(|_| {
        SdfIoError::ColumnMismatch {
            positive: positive.ncols(),
            negative: negative.ncols(),
        }
    })
}

fn read_group(
    npz: &mut NpzReader<File>,
    names: &[String],
    key: &str,
    path: &Path,
) -> Result<Array2<f32>> {
    let name = names
        .iter()
        .find(|name| name.as_str() == key || name.strip_suffix(".npy") == Some(key))
        .ok_or_else(|| SdfIoError::MalformedArchive {
            path: path.to_path_buf(),
            message: format!("missing '{}' entry", key),
        })?;

    // Sample archives are float32; float64 ones are narrowed.
    let array = match npz.by_name::<OwnedRepr<f32>, ndarray::Ix2>(name) {
        Ok(array) => array,
        Err(_) => npz
            .by_name::<OwnedRepr<f64>, ndarray::Ix2>(name)?
            .mapv(|v| v as f32),
    };

    if array.ncols() != SAMPLE_COLUMNS {
        return Err(SdfIoError::MalformedArchive {
            path: path.to_path_buf(),
            message: format!(
                "'{}' has {} columns, expected {}",
                key,
                array.ncols(),
                SAMPLE_COLUMNS
            ),
        });
    }

    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::TempDir;

    fn contains_row(haystack: &Array2<f32>, row: ndarray::ArrayView1<f32>) -> bool {
        haystack.outer_iter().any(|candidate| candidate == row)
    }

    #[test]
    fn test_remove_nans() {
        let samples = array![
            [0.0, 0.0, 0.0, 0.1],
            [1.0, 1.0, 1.0, f32::NAN],
            [2.0, 2.0, 2.0, 0.3],
            [f32::NAN, 3.0, 3.0, 0.4],
        ];
        let clean = remove_nans(&samples);

        // Only the distance column is checked.
        assert_eq!(clean.nrows(), 3);
        assert!(clean.column(SDF_COLUMN).iter().all(|v| !v.is_nan()));
        assert_eq!(clean[[1, 0]], 2.0);
    }

    #[test]
    fn test_subsample_even_is_balanced() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let positive = array![[0.0, 0.0, 0.0, 0.1], [0.0, 0.0, 1.0, 0.2]];
        let negative = array![
            [1.0, 0.0, 0.0, -0.1],
            [1.0, 1.0, 0.0, -0.2],
            [1.0, 1.0, 1.0, -0.3]
        ];

        let samples = subsample(&positive, &negative, 10, &mut rng).unwrap();

        assert_eq!(samples.dim(), (10, 4));
        for row in samples.slice(ndarray::s![..5, ..]).outer_iter() {
            assert!(contains_row(&positive, row));
        }
        for row in samples.slice(ndarray::s![5.., ..]).outer_iter() {
            assert!(contains_row(&negative, row));
        }
    }

    #[test]
    fn test_subsample_odd_truncates() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let positive = array![[0.0, 0.0, 0.0, 0.1]];
        let negative = array![[1.0, 0.0, 0.0, -0.1]];

        let samples = subsample(&positive, &negative, 7, &mut rng).unwrap();
        assert_eq!(samples.nrows(), 6);
    }

    #[test]
    fn test_subsample_empty_group_is_short() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let positive = Array2::<f32>::zeros((0, 4));
        let negative = array![[1.0, 0.0, 0.0, -0.1], [2.0, 0.0, 0.0, -0.2]];

        let samples = subsample(&positive, &negative, 8, &mut rng).unwrap();
        assert_eq!(samples.dim(), (4, 4));
        assert!(samples.column(SDF_COLUMN).iter().all(|&v| v < 0.0));
    }

    #[test]
    fn test_subsample_column_mismatch() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let positive = Array2::<f32>::zeros((2, 4));
        let negative = Array2::<f32>::zeros((2, 13));

        assert!(matches!(
            subsample(&positive, &negative, 4, &mut rng),
            Err(SdfIoError::ColumnMismatch { positive: 4, negative: 13 })
        ));
    }

    #[test]
    fn test_archive_roundtrip_and_clean_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("shape.npz");
        let samples = SdfSamples::new(
            array![[0.0, 0.1, 0.2, 0.05], [0.3, 0.4, 0.5, f32::NAN]],
            array![[0.6, 0.7, 0.8, -0.05]],
        );
        save_archive(&path, &samples).unwrap();

        let raw = load_raw(&path).unwrap();
        assert_eq!(raw.positive.nrows(), 2);
        assert!(raw.positive[[1, SDF_COLUMN]].is_nan());

        let first = load_clean(&path).unwrap();
        let second = load_clean(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.positive.nrows(), 1);
        assert_eq!(first.negative, samples.negative);
    }

    #[test]
    fn test_load_raw_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_raw(&dir.path().join("absent.npz"));
        assert!(matches!(result, Err(SdfIoError::MissingFile { .. })));
    }

    #[test]
    fn test_load_raw_rejects_wrong_width() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.npz");
        let samples = SdfSamples::new(Array2::zeros((2, 5)), Array2::zeros((2, 5)));
        save_archive(&path, &samples).unwrap();

        assert!(matches!(
            load_raw(&path),
            Err(SdfIoError::MalformedArchive { .. })
        ));
    }

    #[test]
    fn test_shuffle_keeps_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let samples = Array2::from_shape_fn((20, 4), |(r, c)| (r * 4 + c) as f32);
        let shuffled = shuffle_rows(&samples, &mut rng);

        assert_eq!(shuffled.dim(), samples.dim());
        for row in samples.outer_iter() {
            assert!(contains_row(&shuffled, row));
        }
    }
}
