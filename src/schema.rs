//! Schema description: column roles for validation and preprocessing
//!
//! Loaded from `config/schema.yaml`:
//!
//! ```yaml
//! columns:
//!   - case_id: category
//!   - no_of_employees: int
//! numerical_columns: [no_of_employees]
//! categorical_columns: [case_id]
//! drop_columns: [case_id]
//! num_features: [no_of_employees]
//! or_columns: []
//! oh_columns: []
//! transform_columns: [no_of_employees]
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Column roles used by validation and transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Declared columns, each a single `name: dtype` entry
    pub columns: Vec<BTreeMap<String, String>>,
    /// Columns that must be present and numeric
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    /// Columns that must be present and categorical
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// Columns removed before preprocessing
    #[serde(default)]
    pub drop_columns: Vec<String>,
    /// Standard-scaled columns
    #[serde(default)]
    pub num_features: Vec<String>,
    /// Ordinal-encoded columns
    #[serde(default)]
    pub or_columns: Vec<String>,
    /// One-hot encoded columns
    #[serde(default)]
    pub oh_columns: Vec<String>,
    /// Yeo-Johnson power-transformed columns
    #[serde(default)]
    pub transform_columns: Vec<String>,
}

impl SchemaConfig {
    /// Load the schema description from YAML
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::persist::read_yaml(path)
    }

    /// Number of declared column entries
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Declared column names in order
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .flat_map(|entry| entry.keys().map(String::as_str))
            .collect()
    }
}
