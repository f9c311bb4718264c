//! Resolution of split entries to sample archives under a data root.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::{ARCHIVE_EXTENSION, SDF_SAMPLES_SUBDIR};
use crate::error::Result;
use crate::samples::{load_clean, load_raw, SdfSamples};
use crate::split::SplitSpec;

/// A shape whose sample archive exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeEntry {
    /// Archive path relative to the samples directory: `dataset/class/instance.npz`.
    pub relative_path: PathBuf,
    /// Class the instance was listed under.
    pub class_name: String,
}

impl ShapeEntry {
    /// Relative path with the archive extension removed.
    pub fn stem_path(&self) -> PathBuf {
        self.relative_path.with_extension("")
    }

    /// True when the file name names a sample archive.
    pub fn is_sample_archive(&self) -> bool {
        self.relative_path
            .to_string_lossy()
            .contains(ARCHIVE_EXTENSION)
    }
}

/// Sample archives rooted at `<data_root>/SdfSamples`.
#[derive(Debug, Clone)]
pub struct SampleStore {
    data_root: PathBuf,
}

impl SampleStore {
    /// Create a store over a data root.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// The data root this store reads from.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory that holds the archives.
    pub fn samples_dir(&self) -> PathBuf {
        self.data_root.join(SDF_SAMPLES_SUBDIR)
    }

    /// Absolute path of an archive given its relative path.
    pub fn archive_path(&self, relative_path: &Path) -> PathBuf {
        self.samples_dir().join(relative_path)
    }

    /// Resolve every `(dataset, class, instance)` triple to an existing archive.
    ///
    /// Missing archives are logged and skipped. Other filesystem errors,
    /// such as permission failures, are returned.
    pub fn resolve(&self, split: &SplitSpec) -> Result<Vec<ShapeEntry>> {
        let samples_dir = self.samples_dir();
        let mut entries = Vec::new();

        for (dataset, class_name, instance) in split.triples() {
            let relative_path = Path::new(dataset)
                .join(class_name)
                .join(format!("{}.{}", instance, ARCHIVE_EXTENSION));

            match fs::metadata(samples_dir.join(&relative_path)) {
                Ok(meta) if meta.is_file() => entries.push(ShapeEntry {
                    relative_path,
                    class_name: class_name.to_string(),
                }),
                Ok(_) => {
                    log::warn!(
                        "Requested sample archive '{}' is not a file",
                        relative_path.display()
                    );
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    log::warn!(
                        "Requested non-existent file '{}'",
                        relative_path.display()
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(entries)
    }

    /// Resolve a split and keep only the relative archive paths.
    pub fn resolve_paths(&self, split: &SplitSpec) -> Result<Vec<PathBuf>> {
        Ok(self
            .resolve(split)?
            .into_iter()
            .map(|entry| entry.relative_path)
            .collect())
    }

    /// Read an archive's groups as stored.
    pub fn load_raw(&self, relative_path: &Path) -> Result<SdfSamples> {
        load_raw(&self.archive_path(relative_path))
    }

    /// Read an archive with NaN rows removed.
    pub fn load_clean(&self, relative_path: &Path) -> Result<SdfSamples> {
        load_clean(&self.archive_path(relative_path))
    }
}
