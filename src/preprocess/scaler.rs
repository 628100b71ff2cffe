//! Standard scaling

use crate::storage::Table;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Mean and population standard deviation; zero deviation scales by 1
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_and_scale(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let scale = variance.sqrt();
    if scale > f64::EPSILON * mean.abs().max(1.0) {
        (mean, scale)
    } else {
        (mean, 1.0)
    }
}

pub(crate) fn standardize(values: &[f64], mean: f64, scale: f64) -> Vec<f64> {
    values.iter().map(|v| (v - mean) / scale).collect()
}

/// Zero-mean, unit-variance scaling per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and scale
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing or non-numeric
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for column in columns {
            let (mean, scale) = mean_and_scale(&table.numeric_column(column)?);
            means.push(mean);
            scales.push(scale);
        }
        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    /// Output column names (the input names)
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    /// Scale into output columns
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing or non-numeric
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                Ok(standardize(
                    &table.numeric_column(column)?,
                    self.means[index],
                    self.scales[index],
                ))
            })
            .collect()
    }
}
