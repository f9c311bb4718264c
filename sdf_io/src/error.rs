//! Error types for sdf_io operations.
//!
//! Missing archives during split resolution are not errors: they are logged
//! and skipped. Everything below is surfaced to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading sample archives, splits and latent codes.
#[derive(Error, Debug)]
pub enum SdfIoError {
    /// A file that must exist was not found.
    #[error("file does not exist: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// No mesh file was found in a shape directory.
    #[error("no mesh file found in {}", dir.display())]
    NoMeshFile {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// More than one mesh file was found where exactly one was expected.
    #[error("found {count} mesh files in {}, expected exactly one", dir.display())]
    MultipleMeshFiles {
        /// Directory that was searched.
        dir: PathBuf,
        /// Number of candidate mesh files.
        count: usize,
    },

    /// A sample archive does not have the expected layout.
    #[error("malformed sample archive {}: {message}", path.display())]
    MalformedArchive {
        /// Archive path.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// Positive and negative sample groups disagree on their column count.
    #[error("sample column mismatch: positive has {positive} columns, negative has {negative}")]
    ColumnMismatch {
        /// Columns in the positive group.
        positive: usize,
        /// Columns in the negative group.
        negative: usize,
    },

    /// The split file is not a `{dataset: {class: [instance]}}` object.
    #[error("invalid split file: {message}")]
    InvalidSplit {
        /// Description of the problem.
        message: String,
    },

    /// A latent code array cannot be squeezed into a flat vector.
    #[error("latent code {} has shape {shape:?}, expected a single non-unit dimension", path.display())]
    InvalidLatent {
        /// Latent code file.
        path: PathBuf,
        /// Shape found in the file.
        shape: Vec<usize>,
    },

    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reading an `.npz` archive.
    #[error("npz read error: {0}")]
    NpzRead(#[from] ndarray_npy::ReadNpzError),

    /// Failure writing an `.npz` archive.
    #[error("npz write error: {0}")]
    NpzWrite(#[from] ndarray_npy::WriteNpzError),

    /// Failure reading an `.npy` array.
    #[error("npy read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// Failure writing an `.npy` array.
    #[error("npy write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// Split file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for sdf_io operations.
pub type Result<T> = std::result::Result<T, SdfIoError>;
