//! Categorical encoders

use crate::storage::Table;
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

fn sorted_categories(values: &[String]) -> Vec<String> {
    let mut categories = values.to_vec();
    categories.sort_unstable();
    categories.dedup();
    categories
}

fn lookup(categories: &[String]) -> FxHashMap<&str, usize> {
    categories
        .iter()
        .enumerate()
        .map(|(index, category)| (category.as_str(), index))
        .collect()
}

/// One output column per (column, category); categories sorted.
///
/// Categories unseen during fit encode as all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learn the categories of each column
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|column| Ok(sorted_categories(&table.string_column(column)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    /// Output column names, `<column>_<category>`
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, categories)| {
                categories
                    .iter()
                    .map(move |category| format!("{column}_{category}"))
            })
            .collect()
    }

    /// Encode into output columns
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        let mut output = Vec::new();
        for (column, categories) in self.columns.iter().zip(&self.categories) {
            let values = table.string_column(column)?;
            let index = lookup(categories);
            let mut encoded = vec![vec![0.0; values.len()]; categories.len()];
            for (row, value) in values.iter().enumerate() {
                if let Some(&position) = index.get(value.as_str()) {
                    encoded[position][row] = 1.0;
                }
            }
            output.extend(encoded);
        }
        Ok(output)
    }
}

/// One output column per column: index of the value among sorted categories.
///
/// Categories unseen during fit are an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OrdinalEncoder {
    /// Learn the categories of each column
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|column| Ok(sorted_categories(&table.string_column(column)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    /// Output column names (the input names)
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    /// Encode into output columns
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing or holds an unseen category
    #[allow(clippy::cast_precision_loss)]
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        let mut output = Vec::with_capacity(self.columns.len());
        for (column, categories) in self.columns.iter().zip(&self.categories) {
            let index = lookup(categories);
            let encoded = table
                .string_column(column)?
                .iter()
                .map(|value| {
                    index.get(value.as_str()).map(|&position| position as f64).ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "Found unknown category '{value}' in column '{column}' during transform"
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            output.push(encoded);
        }
        Ok(output)
    }
}
