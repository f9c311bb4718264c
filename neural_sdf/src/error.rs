//! Error types for neural_sdf.

use thiserror::Error;

/// Errors that can occur while building, training or evaluating the decoder.
#[derive(Error, Debug)]
pub enum NeuralSdfError {
    /// Invalid configuration: class index outside the embedding width,
    /// non-positive layer width, unknown class name and similar.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Index outside a collection.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// Latent interpolation needs at least two shapes.
    #[error("latent interpolation needs at least two shapes, found {found}")]
    NotEnoughShapes {
        /// Number of shapes resolved.
        found: usize,
    },

    /// Tensor or vector shape mismatch.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Storage error from sdf_io.
    #[error("sample store error: {0}")]
    Io(#[from] sdf_io::SdfIoError),

    /// Filesystem error outside the sample store.
    #[error("filesystem error: {0}")]
    FileIo(#[from] std::io::Error),

    /// JSON parsing or serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Saving or loading module records failed.
    #[error("record error: {message}")]
    Record {
        /// Description of the recorder failure.
        message: String,
    },

    /// Tensor data could not be converted.
    #[error("tensor data error: {message}")]
    TensorData {
        /// Description of the conversion failure.
        message: String,
    },

    /// A [`MeshExtractor`](crate::interpolation::MeshExtractor) could not
    /// produce a mesh, for example because the sampled field has no zero
    /// crossing. Implementors return it; the driver propagates it unchanged.
    #[error("mesh extraction failed: {message}")]
    MeshExtraction {
        /// Description of the failure.
        message: String,
    },
}

/// Result type for neural_sdf operations.
pub type Result<T> = std::result::Result<T, NeuralSdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NeuralSdfError::NotEnoughShapes { found: 1 };
        assert!(format!("{}", err).contains("found 1"));

        let err = NeuralSdfError::InvalidConfig {
            message: "class index 9 out of range".to_string(),
        };
        assert!(format!("{}", err).starts_with("invalid configuration"));
    }

    #[test]
    fn test_from_sdf_io() {
        let err: NeuralSdfError = sdf_io::SdfIoError::MissingFile {
            path: "latent.npy".into(),
        }
        .into();
        assert!(matches!(err, NeuralSdfError::Io(_)));
    }
}
