//! sdf_io - sample archives, dataset splits and latent code files.
//!
//! This crate is the storage layer for DeepSDF-style auto-decoder training.
//! It knows nothing about networks; arrays are plain `ndarray` matrices.
//!
//! # Layout
//!
//! ```text
//! <data_root>/SdfSamples/<dataset>/<class>/<instance>.npz   pos: [N, 4], neg: [M, 4]
//! <codes_dir>/<dataset>/<class>/<instance>.npy              latent code
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sdf_io::{SampleStore, SplitSpec, subsample};
//!
//! let split = SplitSpec::from_file("splits/chairs_train.json".as_ref())?;
//! let store = SampleStore::new("data");
//! let shapes = store.resolve(&split)?;
//!
//! let samples = store.load_clean(&shapes[0].relative_path)?;
//! let batch = subsample(&samples.positive, &samples.negative, 16384, &mut rand::thread_rng())?;
//! assert_eq!(batch.ncols(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod latent;
pub mod mesh;
pub mod samples;
pub mod split;
pub mod store;

pub use config::{
    ARCHIVE_EXTENSION, LATENT_EXTENSION, NEGATIVE_KEY, POSITIVE_KEY, SAMPLE_COLUMNS, SDF_COLUMN,
    SDF_SAMPLES_SUBDIR,
};
pub use error::{Result, SdfIoError};
pub use latent::{latent_code_path, load_latent_code, save_latent_code};
pub use mesh::find_mesh_in_directory;
pub use samples::{
    load_clean, load_raw, remove_nans, save_archive, shuffle_rows, subsample, SdfSamples,
};
pub use split::{ClassSplit, DatasetSplit, SplitSpec};
pub use store::{SampleStore, ShapeEntry};
