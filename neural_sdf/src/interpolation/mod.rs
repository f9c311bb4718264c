//! Latent space interpolation between shapes.
//!
//! Consecutive shapes of a split are blended linearly in latent and class
//! embedding space, and every blend step is handed to a [`MeshExtractor`].

mod driver;
mod grid;
mod vectors;

pub use driver::{
    InterpolationReport, LatentInterpolationDriver, MeshExtractor, MeshRequest,
    ReconstructionDirs, INTERPOLATED_SUFFIX, RECONSTRUCTIONS_SUBDIR,
    RECONSTRUCTION_CODES_SUBDIR, RECONSTRUCTION_MESHES_SUBDIR,
};
pub use grid::{evaluate_grid, grid_point, voxel_size, VOXEL_ORIGIN};
pub use vectors::interpolate_vectors;
