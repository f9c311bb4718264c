//! Mesh sequences between consecutive shapes of a split.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::prelude::*;
use sdf_io::{latent_code_path, load_latent_code, ShapeEntry};

use crate::config::InterpolationConfig;
use crate::data::ClassEmbeddingTable;
use crate::error::{NeuralSdfError, Result};
use crate::interpolation::interpolate_vectors;
use crate::nn::ConditionalDecoder;

/// Reconstruction output directory under an experiment.
pub const RECONSTRUCTIONS_SUBDIR: &str = "Reconstructions";

/// Mesh directory under a reconstruction directory.
pub const RECONSTRUCTION_MESHES_SUBDIR: &str = "Meshes";

/// Latent code directory under a reconstruction directory.
pub const RECONSTRUCTION_CODES_SUBDIR: &str = "Codes";

/// Suffix of interpolated mesh stems, followed by `-<step>`.
pub const INTERPOLATED_SUFFIX: &str = "_interpolated";

/// Directories read and written by one interpolation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructionDirs {
    /// Where latent codes are read from.
    pub codes_dir: PathBuf,
    /// Where meshes are written.
    pub meshes_dir: PathBuf,
}

impl ReconstructionDirs {
    /// `<experiment>/Reconstructions/<epoch>/{Codes,Meshes}`.
    pub fn for_epoch(experiment_dir: &Path, epoch: usize) -> Self {
        let root = experiment_dir
            .join(RECONSTRUCTIONS_SUBDIR)
            .join(epoch.to_string());
        Self {
            codes_dir: root.join(RECONSTRUCTION_CODES_SUBDIR),
            meshes_dir: root.join(RECONSTRUCTION_MESHES_SUBDIR),
        }
    }
}

/// Parameters of one mesh extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRequest {
    /// Output path without extension.
    pub output_stem: PathBuf,
    /// Samples per axis of the evaluation grid.
    pub resolution: usize,
    /// Maximum points per decoder evaluation.
    pub max_batch: usize,
}

/// Turns a decoder and one latent code into a mesh file.
///
/// Implementations typically sample the decoder with
/// [`evaluate_grid`](crate::interpolation::evaluate_grid) and run an
/// iso-surface extractor on the result.
pub trait MeshExtractor<B: Backend> {
    /// Write the zero level set of `decoder` at `latent` to `request.output_stem`.
    fn extract(
        &mut self,
        decoder: &ConditionalDecoder<B>,
        latent: &[f32],
        class_embedding: Option<&[f32]>,
        request: &MeshRequest,
    ) -> Result<()>;
}

/// Outcome of an interpolation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpolationReport {
    /// Shape pairs processed.
    pub pairs: usize,
    /// Mesh stems handed to the extractor, in order.
    pub meshes: Vec<PathBuf>,
}

/// Walks consecutive shape pairs and extracts a mesh at every blend step.
#[derive(Debug, Clone)]
pub struct LatentInterpolationDriver {
    config: InterpolationConfig,
    dirs: ReconstructionDirs,
    class_table: Option<ClassEmbeddingTable>,
}

impl LatentInterpolationDriver {
    /// Create a driver; `class_table` is required for class-conditioned decoders.
    pub fn new(
        config: InterpolationConfig,
        dirs: ReconstructionDirs,
        class_table: Option<ClassEmbeddingTable>,
    ) -> Self {
        Self {
            config,
            dirs,
            class_table,
        }
    }

    /// The run's directories.
    pub fn dirs(&self) -> &ReconstructionDirs {
        &self.dirs
    }

    /// Interpolate between `shapes[i]` and `shapes[i + 1]` for every `i`.
    ///
    /// `decoder` should be in evaluation mode: an inference backend, or
    /// `AutodiffModule::valid()` of a trained decoder. A missing latent code
    /// aborts the run; meshes written for earlier pairs stay on disk.
    pub fn run<B, E>(
        &self,
        decoder: &ConditionalDecoder<B>,
        extractor: &mut E,
        shapes: &[ShapeEntry],
    ) -> Result<InterpolationReport>
    where
        B: Backend,
        E: MeshExtractor<B>,
    {
        if shapes.len() < 2 {
            return Err(NeuralSdfError::NotEnoughShapes {
                found: shapes.len(),
            });
        }
        let steps = self.config.steps()?;
        let class_table = match (decoder.class_conditioned(), &self.class_table) {
            (true, Some(table)) => Some(table),
            (true, None) => {
                return Err(NeuralSdfError::InvalidConfig {
                    message: "class conditioned decoder needs a class embedding table"
                        .to_string(),
                })
            }
            (false, _) => None,
        };

        let mut report = InterpolationReport::default();

        for pair in shapes.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if !first.is_sample_archive() {
                continue;
            }

            let embeddings = match class_table {
                Some(table) => Some(interpolate_vectors(
                    &table.one_hot(&first.class_name)?,
                    &table.one_hot(&second.class_name)?,
                    steps,
                )?),
                None => None,
            };

            let latent_first =
                load_latent_code(&latent_code_path(&self.dirs.codes_dir, &first.relative_path))?;
            let latent_second =
                load_latent_code(&latent_code_path(&self.dirs.codes_dir, &second.relative_path))?;
            if latent_first.len() != decoder.latent_size() {
                return Err(NeuralSdfError::ShapeMismatch {
                    expected: vec![decoder.latent_size()],
                    got: vec![latent_first.len()],
                });
            }
            let latents = interpolate_vectors(&latent_first, &latent_second, steps)?;

            let mesh_base = self.dirs.meshes_dir.join(format!(
                "{}{}",
                first.stem_path().display(),
                INTERPOLATED_SUFFIX
            ));
            if let Some(parent) = mesh_base.parent() {
                fs::create_dir_all(parent)?;
            }

            let start = Instant::now();
            for (step, latent) in latents.iter().enumerate() {
                let request = MeshRequest {
                    output_stem: PathBuf::from(format!("{}-{}", mesh_base.display(), step)),
                    resolution: self.config.resolution,
                    max_batch: self.config.max_batch,
                };
                let embedding = embeddings.as_ref().map(|e| e[step].as_slice());

                extractor.extract(decoder, latent, embedding, &request)?;
                log::info!("Wrote mesh {}", request.output_stem.display());
                report.meshes.push(request.output_stem);
            }
            log::debug!(
                "Interpolated {} -> {} in {:?}",
                first.relative_path.display(),
                second.relative_path.display(),
                start.elapsed()
            );
            report.pairs += 1;
        }

        Ok(report)
    }
}
