//! Dataset catalog lookup.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Catalog entry describing how a dataset is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Dataset implementation, e.g. `pandas.CSVDataSet`.
    #[serde(rename = "type")]
    pub dataset_type: String,
    /// Path relative to the project root, when the dataset lives in a file.
    #[serde(default)]
    pub filepath: Option<String>,
    /// Remaining dataset options.
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl DatasetDescriptor {
    /// Creates a descriptor without a file path.
    #[must_use]
    pub fn new(dataset_type: impl Into<String>) -> Self {
        Self {
            dataset_type: dataset_type.into(),
            filepath: None,
            options: BTreeMap::new(),
        }
    }

    /// Sets the file path.
    #[must_use]
    pub fn with_filepath(mut self, filepath: impl Into<String>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }
}

/// Named dataset descriptors, as resolved from the project catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, DatasetDescriptor>);

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a resolved value tree.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry lacks a `type`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, descriptor: DatasetDescriptor) -> Self {
        self.0.insert(name.into(), descriptor);
        self
    }

    /// Looks up a dataset.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.0.get(name)
    }

    /// File path of a dataset, if it has one.
    #[must_use]
    pub fn filepath(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|d| d.filepath.as_deref())
    }
}
