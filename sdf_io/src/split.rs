//! Dataset split files.
//!
//! A split file is a JSON object `{dataset: {class: [instance, ...]}}`. The
//! order of keys in the file is the order shapes are resolved in, so the
//! parser keeps insertion order instead of going through a hash map.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SdfIoError};

/// Instances of one class inside a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSplit {
    /// Class (category) name, e.g. a ShapeNet synset id.
    pub name: String,
    /// Instance names, without archive extension.
    pub instances: Vec<String>,
}

/// Classes of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplit {
    /// Dataset name, e.g. `ShapeNetV2`.
    pub name: String,
    /// Classes in file order.
    pub classes: Vec<ClassSplit>,
}

/// Ordered `{dataset: {class: [instance]}}` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSpec {
    datasets: Vec<DatasetSplit>,
}

impl SplitSpec {
    /// Create an empty split.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append instances for `(dataset, class)`, creating either level if needed.
    pub fn with_instances<I, S>(mut self, dataset: &str, class: &str, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_instances(dataset, class, instances);
        self
    }

    /// Append instances for `(dataset, class)` in place.
    pub fn add_instances<I, S>(&mut self, dataset: &str, class: &str, instances: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dataset_index = match self.datasets.iter().position(|d| d.name == dataset) {
            Some(index) => index,
            None => {
                self.datasets.push(DatasetSplit {
                    name: dataset.to_string(),
                    classes: Vec::new(),
                });
                self.datasets.len() - 1
            }
        };
        let classes = &mut self.datasets[dataset_index].classes;
        let class_index = match classes.iter().position(|c| c.name == class) {
            Some(index) => index,
            None => {
                classes.push(ClassSplit {
                    name: class.to_string(),
                    instances: Vec::new(),
                });
                classes.len() - 1
            }
        };
        classes[class_index]
            .instances
            .extend(instances.into_iter().map(Into::into));
    }

    /// Parse a split from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Read and parse a split file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let datasets = value.as_object().ok_or_else(|| SdfIoError::InvalidSplit {
            message: "top level must be an object of datasets".to_string(),
        })?;

        let mut split = Self::new();
        for (dataset, classes) in datasets {
            let classes = classes.as_object().ok_or_else(|| SdfIoError::InvalidSplit {
                message: format!("dataset '{}' must map class names to instance lists", dataset),
            })?;
            for (class, instances) in classes {
                let instances = instances.as_array().ok_or_else(|| SdfIoError::InvalidSplit {
                    message: format!("class '{}/{}' must be a list of instances", dataset, class),
                })?;
                let names = instances
                    .iter()
                    .map(|instance| {
                        instance.as_str().map(str::to_string).ok_or_else(|| {
                            SdfIoError::InvalidSplit {
                                message: format!(
                                    "instance names in '{}/{}' must be strings",
                                    dataset, class
                                ),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                split.add_instances(dataset, class, names);
            }
        }

        Ok(split)
    }

    /// Datasets in file order.
    pub fn datasets(&self) -> &[DatasetSplit] {
        &self.datasets
    }

    /// Iterate `(dataset, class, instance)` triples in file order.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.datasets.iter().flat_map(|dataset| {
            dataset.classes.iter().flat_map(move |class| {
                class
                    .instances
                    .iter()
                    .map(move |instance| (dataset.name.as_str(), class.name.as_str(), instance.as_str()))
            })
        })
    }

    /// Total number of `(dataset, class, instance)` triples.
    pub fn instance_count(&self) -> usize {
        self.datasets
            .iter()
            .flat_map(|d| d.classes.iter())
            .map(|c| c.instances.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_file_order() {
        let json = r#"{
            "ShapeNetV2": {
                "04256520": ["sofa_b", "sofa_a"],
                "03001627": ["chair_z"]
            },
            "Extra": { "03001627": ["chair_y"] }
        }"#;
        let split = SplitSpec::from_json_str(json).unwrap();

        let triples: Vec<_> = split.triples().collect();
        assert_eq!(
            triples,
            vec![
                ("ShapeNetV2", "04256520", "sofa_b"),
                ("ShapeNetV2", "04256520", "sofa_a"),
                ("ShapeNetV2", "03001627", "chair_z"),
                ("Extra", "03001627", "chair_y"),
            ]
        );
        assert_eq!(split.instance_count(), 4);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            SplitSpec::from_json_str("[1, 2]"),
            Err(SdfIoError::InvalidSplit { .. })
        ));
        assert!(matches!(
            SplitSpec::from_json_str(r#"{"ds": {"chair": "oops"}}"#),
            Err(SdfIoError::InvalidSplit { .. })
        ));
        assert!(matches!(
            SplitSpec::from_json_str(r#"{"ds": {"chair": [3]}}"#),
            Err(SdfIoError::InvalidSplit { .. })
        ));
        assert!(matches!(
            SplitSpec::from_json_str("{not json"),
            Err(SdfIoError::Json(_))
        ));
    }

    #[test]
    fn test_builder_merges_levels() {
        let split = SplitSpec::new()
            .with_instances("a", "chair", ["1"])
            .with_instances("b", "chair", ["2"])
            .with_instances("a", "chair", ["3"]);

        assert_eq!(split.datasets().len(), 2);
        assert_eq!(split.datasets()[0].classes[0].instances, vec!["1", "3"]);
        assert_eq!(split.instance_count(), 3);
    }
}
