//! Column-wise preprocessing
//!
//! A [`PreprocessorPlan`] names which columns go through which transform:
//!
//! | Group | Transform | Output columns |
//! |-------|-----------|----------------|
//! | `oh_columns` | one-hot | one per category |
//! | `or_columns` | ordinal | one per column |
//! | `transform_columns` | Yeo-Johnson + standardize | one per column |
//! | `num_features` | standard scaling | one per column |
//!
//! Groups are emitted in that order. A column may appear in several groups;
//! columns in no group are dropped. Fitting yields a [`FittedPreprocessor`],
//! which is serializable and compares by value.

mod encoders;
mod power;
mod scaler;

pub use encoders::{OneHotEncoder, OrdinalEncoder};
pub use power::{fit_lambda, yeo_johnson, PowerTransformer};
pub use scaler::StandardScaler;

use crate::schema::SchemaConfig;
use crate::storage::Table;
use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which columns each transform applies to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreprocessorPlan {
    /// One-hot encoded columns
    pub one_hot: Vec<String>,
    /// Ordinal-encoded columns
    pub ordinal: Vec<String>,
    /// Yeo-Johnson columns
    pub power: Vec<String>,
    /// Standard-scaled columns
    pub scale: Vec<String>,
}

impl PreprocessorPlan {
    /// Plan from the schema's column roles
    #[must_use]
    pub fn from_schema(schema: &SchemaConfig) -> Self {
        Self {
            one_hot: schema.oh_columns.clone(),
            ordinal: schema.or_columns.clone(),
            power: schema.transform_columns.clone(),
            scale: schema.num_features.clone(),
        }
    }

    /// Fit every group on `table`
    ///
    /// # Errors
    ///
    /// Returns error if a planned column is missing or has the wrong type
    pub fn fit(&self, table: &Table) -> Result<FittedPreprocessor> {
        let mut steps = Vec::with_capacity(4);
        if !self.one_hot.is_empty() {
            steps.push(FittedStep::OneHot(OneHotEncoder::fit(table, &self.one_hot)?));
        }
        if !self.ordinal.is_empty() {
            steps.push(FittedStep::Ordinal(OrdinalEncoder::fit(table, &self.ordinal)?));
        }
        if !self.power.is_empty() {
            steps.push(FittedStep::Power(PowerTransformer::fit(table, &self.power)?));
        }
        if !self.scale.is_empty() {
            steps.push(FittedStep::Scale(StandardScaler::fit(table, &self.scale)?));
        }

        if steps.is_empty() {
            return Err(Error::Schema(
                "Preprocessor plan selects no columns".to_string(),
            ));
        }
        Ok(FittedPreprocessor { steps })
    }

    /// Fit on `table` and transform it
    ///
    /// # Errors
    ///
    /// Returns error if fitting or transforming fails
    pub fn fit_transform(&self, table: &Table) -> Result<(FittedPreprocessor, Array2<f64>)> {
        let fitted = self.fit(table)?;
        let transformed = fitted.transform(table)?;
        Ok((fitted, transformed))
    }
}

/// One fitted column group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedStep {
    /// One-hot encoder
    OneHot(OneHotEncoder),
    /// Ordinal encoder
    Ordinal(OrdinalEncoder),
    /// Yeo-Johnson power transform
    Power(PowerTransformer),
    /// Standard scaler
    Scale(StandardScaler),
}

impl FittedStep {
    fn feature_names(&self) -> Vec<String> {
        match self {
            Self::OneHot(step) => step.feature_names(),
            Self::Ordinal(step) => step.feature_names(),
            Self::Power(step) => step.feature_names(),
            Self::Scale(step) => step.feature_names(),
        }
    }

    fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        match self {
            Self::OneHot(step) => step.transform(table),
            Self::Ordinal(step) => step.transform(table),
            Self::Power(step) => step.transform(table),
            Self::Scale(step) => step.transform(table),
        }
    }
}

/// Fitted column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    steps: Vec<FittedStep>,
}

impl FittedPreprocessor {
    /// Fitted groups in output order
    #[must_use]
    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    /// Names of the output columns, in order
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.steps.iter().flat_map(FittedStep::feature_names).collect()
    }

    /// Number of output columns
    #[must_use]
    pub fn n_output_features(&self) -> usize {
        self.feature_names().len()
    }

    /// Transform a table into a `rows × n_output_features` matrix
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing, has the wrong type, or holds an
    /// unseen ordinal category
    pub fn transform(&self, table: &Table) -> Result<Array2<f64>> {
        let mut columns = Vec::new();
        for step in &self.steps {
            columns.extend(step.transform(table)?);
        }

        let rows = table.num_rows();
        let mut matrix = Array2::zeros((rows, columns.len()));
        for (index, column) in columns.iter().enumerate() {
            for (row, &value) in column.iter().enumerate() {
                matrix[[row, index]] = value;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Document;
    use serde_json::json;

    fn table() -> Table {
        let docs: Vec<Document> = [
            ("Asia", "Y", 100, 1000.5),
            ("Europe", "N", 2500, 52000.0),
            ("Asia", "N", 40, 87000.25),
            ("Africa", "Y", 12000, 61000.0),
        ]
        .iter()
        .map(|(continent, experience, employees, wage)| {
            json!({
                "continent": continent,
                "has_job_experience": experience,
                "no_of_employees": employees,
                "prevailing_wage": wage,
                "ignored": "x",
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect();
        Table::from_documents(&docs).unwrap()
    }

    fn plan() -> PreprocessorPlan {
        PreprocessorPlan {
            one_hot: vec!["continent".to_string()],
            ordinal: vec!["has_job_experience".to_string()],
            power: vec!["no_of_employees".to_string()],
            scale: vec!["no_of_employees".to_string(), "prevailing_wage".to_string()],
        }
    }

    #[test]
    fn test_output_layout() {
        let (fitted, matrix) = plan().fit_transform(&table()).unwrap();

        assert_eq!(
            fitted.feature_names(),
            vec![
                "continent_Africa",
                "continent_Asia",
                "continent_Europe",
                "has_job_experience",
                "no_of_employees",
                "no_of_employees",
                "prevailing_wage",
            ]
        );
        assert_eq!(matrix.dim(), (4, 7));
        // Row 0: Asia, Y
        assert_eq!(matrix.row(0).to_vec()[..4], [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_scaled_columns_are_standardized() {
        let (_, matrix) = plan().fit_transform(&table()).unwrap();
        for column in 4..7 {
            let values = matrix.column(column);
            let mean = values.sum() / 4.0;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-9);
            assert!((variance - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_independent_fits_differ() {
        let table = table();
        let first = plan().fit(&table.take(&[0, 1]).unwrap()).unwrap();
        let second = plan().fit(&table.take(&[2, 3]).unwrap()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_column_fails() {
        let mut plan = plan();
        plan.scale.push("company_age".to_string());
        assert!(plan.fit(&table()).is_err());
    }

    #[test]
    fn test_empty_plan_fails() {
        let result = PreprocessorPlan::default().fit(&table());
        assert!(matches!(result, Err(Error::Schema(_))));
    }
}
