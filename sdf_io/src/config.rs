//! On-disk layout constants for sample archives and latent codes.

/// Subdirectory of a data root that holds the per-shape SDF sample archives.
pub const SDF_SAMPLES_SUBDIR: &str = "SdfSamples";

/// Extension of a per-shape sample archive.
pub const ARCHIVE_EXTENSION: &str = "npz";

/// Extension of a persisted latent code.
pub const LATENT_EXTENSION: &str = "npy";

/// Extension of a mesh file searched by [`find_mesh_in_directory`](crate::find_mesh_in_directory).
pub const MESH_EXTENSION: &str = "obj";

/// Archive entry holding samples with positive signed distance.
pub const POSITIVE_KEY: &str = "pos";

/// Archive entry holding samples with negative signed distance.
pub const NEGATIVE_KEY: &str = "neg";

/// Columns per sample row: x, y, z, signed distance.
pub const SAMPLE_COLUMNS: usize = 4;

/// Column index of the signed distance value.
pub const SDF_COLUMN: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdf_column_is_last() {
        assert_eq!(SDF_COLUMN + 1, SAMPLE_COLUMNS);
    }
}
