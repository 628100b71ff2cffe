//! Data transformation: features, encoding, class rebalancing

use crate::artifact::{DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact};
use crate::config::DataTransformationConfig;
use crate::error::{Stage, StageContext};
use crate::features::{attach_labels, prepare_features};
use crate::persist::{save_array, save_object};
use crate::preprocess::{FittedPreprocessor, PreprocessorPlan};
use crate::resample::{class_counts, SmoteEnn};
use crate::schema::SchemaConfig;
use crate::storage::Table;
use crate::{Error, Result};
use ndarray::Array2;

/// Transformation stage
#[derive(Debug)]
pub struct DataTransformation {
    ingestion: DataIngestionArtifact,
    validation: DataValidationArtifact,
    config: DataTransformationConfig,
    schema: SchemaConfig,
}

impl DataTransformation {
    /// Transform the splits named by `ingestion`, gated on `validation`
    #[must_use]
    pub const fn new(
        ingestion: DataIngestionArtifact,
        validation: DataValidationArtifact,
        config: DataTransformationConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            ingestion,
            validation,
            config,
            schema,
        }
    }

    /// Column plan derived from the schema roles
    #[must_use]
    pub fn get_data_transformer_object(&self) -> PreprocessorPlan {
        let plan = PreprocessorPlan::from_schema(&self.schema);
        tracing::debug!(?plan, "Built preprocessor plan");
        plan
    }

    /// Prepare one split: derive features, fit the plan on it, rebalance and
    /// attach labels as the last column.
    fn transform_split(
        &self,
        plan: &PreprocessorPlan,
        table: &Table,
        split: &str,
    ) -> Result<(FittedPreprocessor, Array2<f64>)> {
        let prepared = prepare_features(table, &self.schema, self.config.current_year)?;
        let (preprocessor, features) = plan.fit_transform(&prepared.features)?;
        tracing::info!(split, shape = ?features.dim(), "Applied preprocessor");

        let (features, labels) =
            SmoteEnn::new(self.config.random_seed).fit_resample(features.view(), &prepared.labels)?;
        tracing::info!(
            split,
            rows = labels.len(),
            classes = ?class_counts(&labels),
            "Applied SMOTEENN"
        );

        Ok((preprocessor, attach_labels(features.view(), &labels)?))
    }

    /// Run the transformation.
    ///
    /// Each split gets its own preprocessor fit. The one fitted on the test
    /// split is the one persisted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`] (stage-wrapped) before touching any
    /// file when validation did not pass, or the first transformation failure
    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifact> {
        let _span = tracing::info_span!("data_transformation").entered();

        if !self.validation.validation_status() {
            return Err(Error::ValidationFailed(self.validation.message().to_string()))
                .stage(Stage::DataTransformation);
        }
        tracing::info!("Starting data transformation");

        let plan = self.get_data_transformer_object();
        let train = Table::read_parquet(self.ingestion.trained_file_path())
            .stage(Stage::DataTransformation)?;
        let test = Table::read_parquet(self.ingestion.test_file_path())
            .stage(Stage::DataTransformation)?;

        let (_, train_arr) = self
            .transform_split(&plan, &train, "train")
            .stage(Stage::DataTransformation)?;
        let (preprocessor, test_arr) = self
            .transform_split(&plan, &test, "test")
            .stage(Stage::DataTransformation)?;

        save_object(&self.config.transformed_object_file_path, &preprocessor)
            .stage(Stage::DataTransformation)?;
        save_array(&self.config.transformed_train_file_path, &train_arr)
            .stage(Stage::DataTransformation)?;
        save_array(&self.config.transformed_test_file_path, &test_arr)
            .stage(Stage::DataTransformation)?;
        tracing::info!("Saved the preprocessor object and transformed arrays");

        Ok(DataTransformationArtifact::new(
            &self.config.transformed_object_file_path,
            &self.config.transformed_train_file_path,
            &self.config.transformed_test_file_path,
        ))
    }
}
