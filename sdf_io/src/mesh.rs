//! Locating the source mesh of a shape.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MESH_EXTENSION;
use crate::error::{Result, SdfIoError};

/// Find the single mesh file of a shape directory.
///
/// Looks at `.obj` files directly in `shape_dir` and one directory below it.
/// Zero matches and several matches are distinct errors.
pub fn find_mesh_in_directory(shape_dir: &Path) -> Result<PathBuf> {
    let mut meshes = Vec::new();

    for entry in fs::read_dir(shape_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            for nested in fs::read_dir(&path)? {
                let nested = nested?.path();
                if is_mesh(&nested) {
                    meshes.push(nested);
                }
            }
        } else if is_mesh(&path) {
            meshes.push(path);
        }
    }

    match meshes.len() {
        0 => Err(SdfIoError::NoMeshFile {
            dir: shape_dir.to_path_buf(),
        }),
        1 => Ok(meshes.remove(0)),
        count => Err(SdfIoError::MultipleMeshFiles {
            dir: shape_dir.to_path_buf(),
            count,
        }),
    }
}

fn is_mesh(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == MESH_EXTENSION)
}
