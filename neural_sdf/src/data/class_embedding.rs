//! One-hot class conditioning.

use std::collections::HashMap;

use crate::config::CLASS_EMBEDDING_WIDTH;
use crate::error::{NeuralSdfError, Result};

/// One-hot vector for a class index.
///
/// Fails with [`NeuralSdfError::InvalidConfig`] when `index` is outside
/// `[0, CLASS_EMBEDDING_WIDTH)`.
pub fn one_hot(index: usize) -> Result<[f32; CLASS_EMBEDDING_WIDTH]> {
    if index >= CLASS_EMBEDDING_WIDTH {
        return Err(NeuralSdfError::InvalidConfig {
            message: format!(
                "class index {} out of range for embedding width {}",
                index, CLASS_EMBEDDING_WIDTH
            ),
        });
    }

    let mut vector = [0.0; CLASS_EMBEDDING_WIDTH];
    vector[index] = 1.0;
    Ok(vector)
}

/// Mapping from class name to one-hot index.
///
/// Every index is checked against the embedding width when the table is
/// built, so lookups of known classes never fail afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassEmbeddingTable {
    indices: HashMap<String, usize>,
}

impl ClassEmbeddingTable {
    /// Build a table, rejecting indices outside the embedding width.
    pub fn new(indices: HashMap<String, usize>) -> Result<Self> {
        if let Some((name, &index)) = indices
            .iter()
            .find(|(_, &index)| index >= CLASS_EMBEDDING_WIDTH)
        {
            return Err(NeuralSdfError::InvalidConfig {
                message: format!(
                    "class '{}' has index {}, embedding width is {}",
                    name, index, CLASS_EMBEDDING_WIDTH
                ),
            });
        }
        Ok(Self { indices })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no class is registered.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index of a class.
    pub fn index_of(&self, class_name: &str) -> Result<usize> {
        self.indices
            .get(class_name)
            .copied()
            .ok_or_else(|| NeuralSdfError::InvalidConfig {
                message: format!("class '{}' is not in the embedding table", class_name),
            })
    }

    /// One-hot vector of a class.
    pub fn one_hot(&self, class_name: &str) -> Result<[f32; CLASS_EMBEDDING_WIDTH]> {
        one_hot(self.index_of(class_name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_laws() {
        for index in 0..CLASS_EMBEDDING_WIDTH {
            let vector = one_hot(index).unwrap();
            assert_eq!(vector.len(), CLASS_EMBEDDING_WIDTH);
            assert_eq!(vector[index], 1.0);
            assert_eq!(vector.iter().filter(|&&v| v == 0.0).count(), 8);
        }
    }

    #[test]
    fn test_one_hot_out_of_range() {
        assert!(matches!(
            one_hot(CLASS_EMBEDDING_WIDTH),
            Err(NeuralSdfError::InvalidConfig { .. })
        ));
        assert!(one_hot(100).is_err());
    }

    #[test]
    fn test_table_validates_indices() {
        let table = ClassEmbeddingTable::new(HashMap::from([("chair".to_string(), 9)]));
        assert!(matches!(table, Err(NeuralSdfError::InvalidConfig { .. })));
    }

    #[test]
    fn test_table_lookup() {
        let table = ClassEmbeddingTable::new(HashMap::from([
            ("chair".to_string(), 0),
            ("sofa".to_string(), 8),
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.index_of("sofa").unwrap(), 8);
        assert_eq!(table.one_hot("chair").unwrap()[0], 1.0);
        assert!(table.index_of("lamp").is_err());
    }
}
