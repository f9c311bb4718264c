//! Shape datasets and class conditioning.

mod class_embedding;
mod dataset;

pub use class_embedding::{one_hot, ClassEmbeddingTable};
pub use dataset::{append_class_columns, Materialization, ShapeDataset};
