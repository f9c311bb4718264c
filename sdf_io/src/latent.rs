//! Persisted per-shape latent codes.
//!
//! A latent code is stored as a single `.npy` array named after the shape's
//! archive. Leading or trailing unit dimensions (`[1, 256]`, `[1, 1, 256]`)
//! are squeezed away on load.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, ArrayD};
use ndarray_npy::{read_npy, write_npy};

use crate::config::LATENT_EXTENSION;
use crate::error::{Result, SdfIoError};

/// Where the latent code of a shape lives inside `codes_dir`.
pub fn latent_code_path(codes_dir: &Path, relative_archive: &Path) -> PathBuf {
    codes_dir.join(relative_archive.with_extension(LATENT_EXTENSION))
}

/// Load a latent code and squeeze it to a flat vector.
pub fn load_latent_code(path: &Path) -> Result<Vec<f32>> {
    if !path.is_file() {
        return Err(SdfIoError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    // Codes saved as float64 are narrowed, as sample archives are.
    let array = match read_npy::<_, ArrayD<f32>>(path) {
        Ok(array) => array,
        Err(_) => read_npy::<_, ArrayD<f64>>(path)?.mapv(|v| v as f32),
    };
    squeeze_to_vector(array, path)
}

/// Write a latent code as a 1-D array, creating parent directories.
pub fn save_latent_code(path: &Path, code: &[f32]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_npy(path, &Array1::from(code.to_vec()))?;
    Ok(())
}

fn squeeze_to_vector(array: ArrayD<f32>, path: &Path) -> Result<Vec<f32>> {
    let shape = array.shape().to_vec();
    let non_unit = shape.iter().filter(|&&dim| dim != 1).count();

    if non_unit > 1 || array.is_empty() {
        return Err(SdfIoError::InvalidLatent {
            path: path.to_path_buf(),
            shape,
        });
    }

    Ok(array.iter().copied().collect())
}
