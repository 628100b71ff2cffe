//! Data validation: schema conformance and train/test drift

use crate::artifact::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::{ColumnCountRule, DataValidationConfig};
use crate::drift::{detect_drift, DriftReport, DriftThresholds};
use crate::error::{Stage, StageContext};
use crate::persist::write_yaml;
use crate::schema::SchemaConfig;
use crate::storage::Table;
use crate::Result;

/// Validation stage
#[derive(Debug)]
pub struct DataValidation {
    ingestion: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: SchemaConfig,
}

impl DataValidation {
    /// Validate the splits named by `ingestion`
    #[must_use]
    pub const fn new(
        ingestion: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            ingestion,
            config,
            schema,
        }
    }

    /// Schema size check, per the configured [`ColumnCountRule`]
    #[must_use]
    pub fn validate_number_of_columns(&self, table: &Table) -> bool {
        let actual = match self.config.column_count_rule {
            ColumnCountRule::SchemaEntriesVsRows => table.num_rows(),
            ColumnCountRule::SchemaEntriesVsColumns => table.num_columns(),
        };
        let status = self.schema.column_count() == actual;
        tracing::info!(
            rule = ?self.config.column_count_rule,
            expected = self.schema.column_count(),
            actual,
            status,
            "Is required column present"
        );
        status
    }

    /// Schema numerical and categorical columns absent from `table`
    #[must_use]
    pub fn missing_columns(&self, table: &Table) -> Vec<String> {
        let mut missing = Vec::new();
        for (kind, columns) in [
            ("numerical", &self.schema.numerical_columns),
            ("categorical", &self.schema.categorical_columns),
        ] {
            for column in columns {
                if !table.has_column(column) {
                    tracing::info!(column = %column, kind, "Missing column");
                    missing.push(column.clone());
                }
            }
        }
        missing
    }

    /// True when every schema numerical and categorical column is present
    #[must_use]
    pub fn is_column_exist(&self, table: &Table) -> bool {
        self.missing_columns(table).is_empty()
    }

    /// Compute drift of `current` against `reference` and write the report
    ///
    /// # Errors
    ///
    /// Returns error if a column cannot be read or the report cannot be written
    pub fn detect_dataset_drift(&self, reference: &Table, current: &Table) -> Result<DriftReport> {
        let thresholds = DriftThresholds {
            p_value: self.config.drift_p_value_threshold,
            dataset_share: self.config.dataset_drift_share,
        };
        let report = detect_drift(reference, current, thresholds)?;
        write_yaml(&self.config.drift_report_file_path, &report, true)?;

        let (n_drifted, n_features) = report.drift_counts();
        tracing::info!("{n_drifted}/{n_features} drift detected.");
        Ok(report)
    }

    /// Run the schema checks on both splits and, if they pass, drift detection.
    ///
    /// A failed check is not an error: it yields an artifact with a false
    /// status and the concatenated failure messages.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Stage`] if a split cannot be read or the drift
    /// report cannot be written
    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        let _span = tracing::info_span!("data_validation").entered();
        tracing::info!("Starting data validation");

        let train =
            Table::read_parquet(self.ingestion.trained_file_path()).stage(Stage::DataValidation)?;
        let test =
            Table::read_parquet(self.ingestion.test_file_path()).stage(Stage::DataValidation)?;

        let mut message = String::new();
        if !self.validate_number_of_columns(&train) {
            message.push_str("Columns are missing in the training dataframe. ");
        }
        if !self.validate_number_of_columns(&test) {
            message.push_str("Columns are missing in the test dataframe. ");
        }
        for (split, table) in [("train", &train), ("test", &test)] {
            let missing = self.missing_columns(table);
            if !missing.is_empty() {
                message.push_str(&format!(
                    "Columns{missing:?} are missing in the {split} dataframe. "
                ));
            }
        }

        let validation_status = message.is_empty();
        if validation_status {
            let report = self.detect_dataset_drift(&train, &test).stage(Stage::DataValidation)?;
            message = if report.dataset_drift {
                "Drift detected".to_string()
            } else {
                "Drift not detected".to_string()
            };
        } else {
            tracing::info!(message = %message, "Validation error");
        }

        let artifact = DataValidationArtifact::new(
            validation_status,
            message,
            &self.config.drift_report_file_path,
        );
        tracing::info!(?artifact, "Data validation artifact");
        Ok(artifact)
    }
}
