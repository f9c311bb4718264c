//! Experiment description files (`specs.json`).
//!
//! The file uses PascalCase top-level keys and the decoder's snake_case
//! argument names under `NetworkSpecs`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::DecoderConfig;
use crate::data::ClassEmbeddingTable;
use crate::error::Result;

/// Name of the specs file inside an experiment directory.
pub const SPECS_FILENAME: &str = "specs.json";

fn default_arch() -> String {
    "deep_sdf_decoder".to_string()
}

fn default_transformer_hidden_size() -> usize {
    1024
}

fn default_num_heads() -> usize {
    16
}

fn default_code_init_std_dev() -> f64 {
    1.0
}

/// Decoder arguments as written in `NetworkSpecs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpecs {
    /// Hidden layer widths.
    pub dims: Vec<usize>,
    /// Layer indices with dropout; `null` means none.
    #[serde(default)]
    pub dropout: Option<Vec<usize>>,
    /// Shared dropout probability.
    #[serde(default)]
    pub dropout_prob: f64,
    /// Layer indices with normalization.
    #[serde(default)]
    pub norm_layers: Vec<usize>,
    /// Skip-connection layer indices.
    #[serde(default)]
    pub latent_in: Vec<usize>,
    /// Weight normalization instead of layer norm.
    #[serde(default)]
    pub weight_norm: bool,
    /// Coordinates into every layer; `null` means false.
    #[serde(default)]
    pub xyz_in_all: Option<bool>,
    /// Tanh on the final layer.
    #[serde(default)]
    pub use_tanh: bool,
    /// Dropout on the latent part of the input.
    #[serde(default)]
    pub latent_dropout: bool,
    /// One-hot class conditioning.
    #[serde(default)]
    pub class_embedding: bool,
    /// Attention blocks on alternating layers.
    #[serde(default)]
    pub use_transformers: bool,
    /// Attention feed-forward width.
    #[serde(default = "default_transformer_hidden_size")]
    pub transformer_hidden_size: usize,
    /// Attention head count.
    #[serde(default = "default_num_heads")]
    pub num_heads: usize,
}

/// Contents of an experiment's `specs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpecs {
    /// Network architecture name.
    #[serde(rename = "NetworkArch", default = "default_arch")]
    pub network_arch: String,
    /// Latent code length.
    #[serde(rename = "CodeLength")]
    pub code_length: usize,
    /// Decoder arguments.
    #[serde(rename = "NetworkSpecs")]
    pub network_specs: NetworkSpecs,
    /// Class name to one-hot index.
    #[serde(rename = "ClassEmbedding", default)]
    pub class_embedding: HashMap<String, usize>,
    /// Standard deviation of the initial latent codes, before scaling by
    /// `1 / sqrt(CodeLength)`.
    #[serde(rename = "CodeInitStdDev", default = "default_code_init_std_dev")]
    pub code_init_std_dev: f64,
}

impl ExperimentSpecs {
    /// Parse experiment specs from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `specs.json` from an experiment directory.
    pub fn from_experiment_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(SPECS_FILENAME);
        if !path.is_file() {
            return Err(sdf_io::SdfIoError::MissingFile { path }.into());
        }
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Decoder configuration described by these specs.
    pub fn decoder_config(&self) -> DecoderConfig {
        let specs = &self.network_specs;
        DecoderConfig::new(self.code_length, specs.dims.clone())
            .with_dropout(specs.dropout.clone().unwrap_or_default())
            .with_dropout_prob(specs.dropout_prob)
            .with_norm_layers(specs.norm_layers.clone())
            .with_latent_in(specs.latent_in.clone())
            .with_weight_norm(specs.weight_norm)
            .with_xyz_in_all(specs.xyz_in_all.unwrap_or(false))
            .with_use_tanh(specs.use_tanh)
            .with_latent_dropout(specs.latent_dropout)
            .with_class_embedding(specs.class_embedding)
            .with_use_transformers(specs.use_transformers)
            .with_transformer_hidden_size(specs.transformer_hidden_size)
            .with_num_heads(specs.num_heads)
    }

    /// Class embedding table, present only when the decoder is class conditioned.
    pub fn class_embedding_table(&self) -> Result<Option<ClassEmbeddingTable>> {
        if !self.network_specs.class_embedding {
            return Ok(None);
        }
        ClassEmbeddingTable::new(self.class_embedding.clone()).map(Some)
    }
}
