//! Feature preparation shared by training, evaluation and prediction
//!
//! Training-time and evaluation-time preprocessing must agree, so both go
//! through [`prepare_features`]: split off the target, derive company age,
//! drop the schema's excluded columns and map labels to integers.

use crate::constants::{COMPANY_AGE_COLUMN, ESTABLISHMENT_YEAR_COLUMN, TARGET_COLUMN};
use crate::schema::SchemaConfig;
use crate::storage::Table;
use crate::{Error, Result};
use arrow::array::{ArrayRef, Int64Array};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Visa case outcome and its integer label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Label 0
    Certified,
    /// Label 1
    Denied,
}

impl CaseStatus {
    /// Integer label used by the models
    #[must_use]
    pub const fn label(self) -> usize {
        match self {
            Self::Certified => 0,
            Self::Denied => 1,
        }
    }

    /// Inverse of [`CaseStatus::label`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for labels other than 0 and 1
    pub fn from_label(label: usize) -> Result<Self> {
        match label {
            0 => Ok(Self::Certified),
            1 => Ok(Self::Denied),
            other => Err(Error::InvalidInput(format!("Unknown case status label {other}"))),
        }
    }
}

impl FromStr for CaseStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "Certified" => Ok(Self::Certified),
            "Denied" => Ok(Self::Denied),
            other => Err(Error::InvalidInput(format!("Unknown case status '{other}'"))),
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certified => f.write_str("Certified"),
            Self::Denied => f.write_str("Denied"),
        }
    }
}

/// Input features plus integer labels
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Feature columns after derivation and drops
    pub features: Table,
    /// One label per row (see [`CaseStatus::label`])
    pub labels: Vec<usize>,
}

/// Add `company_age = current_year - yr_of_estab`.
///
/// # Errors
///
/// Returns error if the establishment-year column is missing or non-numeric
pub fn with_company_age(table: &Table, current_year: i32) -> Result<Table> {
    let years = table.numeric_column(ESTABLISHMENT_YEAR_COLUMN)?;
    #[allow(clippy::cast_possible_truncation)]
    let ages: ArrayRef = Arc::new(Int64Array::from_iter_values(
        years
            .iter()
            .map(|&year| i64::from(current_year) - year.round() as i64),
    ));
    table.with_column(COMPANY_AGE_COLUMN, ages)
}

/// Map the target column's values to integer labels
///
/// # Errors
///
/// Returns error if the column is missing or holds an unknown status
pub fn encode_labels(table: &Table) -> Result<Vec<usize>> {
    table
        .string_column(TARGET_COLUMN)?
        .iter()
        .map(|value| value.parse::<CaseStatus>().map(CaseStatus::label))
        .collect()
}

/// Derive features and labels from a raw visa table.
///
/// The engineered age column is added before the schema's `drop_columns` are
/// removed, so dropping the establishment year is safe.
///
/// # Errors
///
/// Returns error if required columns are missing or labels are unknown
pub fn prepare_features(
    table: &Table,
    schema: &SchemaConfig,
    current_year: i32,
) -> Result<PreparedFeatures> {
    let labels = encode_labels(table)?;
    let features = derive_inputs(&table.drop_columns(&[TARGET_COLUMN])?, schema, current_year)?;
    Ok(PreparedFeatures { features, labels })
}

/// Feature derivation without a target column, for inference inputs.
///
/// Tables that already carry `company_age` (and no establishment year) pass
/// through unchanged apart from the drops that apply.
///
/// # Errors
///
/// Returns error if neither `company_age` nor `yr_of_estab` is present
pub fn derive_inputs(table: &Table, schema: &SchemaConfig, current_year: i32) -> Result<Table> {
    let with_age = if table.has_column(ESTABLISHMENT_YEAR_COLUMN) {
        with_company_age(table, current_year)?
    } else if table.has_column(COMPANY_AGE_COLUMN) {
        table.clone()
    } else {
        return Err(Error::Schema(format!(
            "Neither '{ESTABLISHMENT_YEAR_COLUMN}' nor '{COMPANY_AGE_COLUMN}' present"
        )));
    };

    let drops: Vec<&str> = schema
        .drop_columns
        .iter()
        .map(String::as_str)
        .filter(|name| with_age.has_column(name))
        .collect();
    with_age.drop_columns(&drops)
}

/// Append labels as the last column of a feature matrix
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the row and label counts differ
#[allow(clippy::cast_precision_loss)]
pub fn attach_labels(features: ArrayView2<'_, f64>, labels: &[usize]) -> Result<Array2<f64>> {
    if features.nrows() != labels.len() {
        return Err(Error::InvalidInput(format!(
            "Feature rows ({}) and labels ({}) differ",
            features.nrows(),
            labels.len()
        )));
    }
    let column = Array2::from_shape_fn((labels.len(), 1), |(row, _)| labels[row] as f64);
    Ok(ndarray::concatenate(Axis(1), &[features.reborrow(), column.view()])?)
}

/// Split a matrix written by [`attach_labels`] back into features and labels
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the matrix has no columns or the last
/// column holds anything but non-negative integers
pub fn detach_labels(array: &Array2<f64>) -> Result<(Array2<f64>, Vec<usize>)> {
    let Some(last) = array.ncols().checked_sub(1) else {
        return Err(Error::InvalidInput("Array has no label column".to_string()));
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let labels = array
        .column(last)
        .iter()
        .map(|&value| {
            if value >= 0.0 && value.fract() == 0.0 {
                Ok(value as usize)
            } else {
                Err(Error::InvalidInput(format!("Invalid label value {value}")))
            }
        })
        .collect::<Result<Vec<usize>>>()?;
    let features = array.slice(ndarray::s![.., ..last]).to_owned();
    Ok((features, labels))
}
