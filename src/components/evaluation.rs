//! Model evaluation: trained model versus the registered production model

use crate::artifact::{DataIngestionArtifact, ModelEvaluationArtifact, ModelTrainerArtifact};
use crate::config::ModelEvaluationConfig;
use crate::error::{Stage, StageContext};
use crate::features::prepare_features;
use crate::model::metrics::f1_score;
use crate::registry::{ObjectStore, RegistryEstimator};
use crate::schema::SchemaConfig;
use crate::storage::Table;
use crate::Result;

/// Outcome of comparing the trained model with the registered one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationModelResponse {
    /// Held-out F1 of the trained model
    pub trained_model_f1_score: f64,
    /// F1 of the registered model, if one exists
    pub best_model_f1_score: Option<f64>,
    /// Trained F1 strictly above the registered F1 (or 0)
    pub is_model_accepted: bool,
    /// Trained F1 minus the registered F1 (or 0)
    pub difference: f64,
}

impl EvaluationModelResponse {
    /// Apply the acceptance rule. A missing registered model scores 0.
    #[must_use]
    pub fn compare(trained_model_f1_score: f64, best_model_f1_score: Option<f64>) -> Self {
        let baseline = best_model_f1_score.unwrap_or(0.0);
        Self {
            trained_model_f1_score,
            best_model_f1_score,
            is_model_accepted: trained_model_f1_score > baseline,
            difference: trained_model_f1_score - baseline,
        }
    }
}

/// Evaluation stage
pub struct ModelEvaluation<'a> {
    config: ModelEvaluationConfig,
    ingestion: DataIngestionArtifact,
    trainer: ModelTrainerArtifact,
    schema: SchemaConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> ModelEvaluation<'a> {
    /// Evaluate `trainer`'s model against the registry in `store`
    #[must_use]
    pub fn new(
        config: ModelEvaluationConfig,
        ingestion: DataIngestionArtifact,
        trainer: ModelTrainerArtifact,
        schema: SchemaConfig,
        store: &'a dyn ObjectStore,
    ) -> Self {
        Self {
            config,
            ingestion,
            trainer,
            schema,
            store,
        }
    }

    /// The registered production model, if there is one
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be queried
    pub fn get_best_model(&self) -> Result<Option<RegistryEstimator<'a>>> {
        let estimator =
            RegistryEstimator::new(self.store, &self.config.bucket_name, &self.config.model_key);
        Ok(estimator.is_model_present()?.then_some(estimator))
    }

    /// Score the registered model on the test split and compare
    ///
    /// # Errors
    ///
    /// Returns error if the test split cannot be prepared or the registered
    /// model cannot be loaded or applied
    pub fn evaluate_model(&self) -> Result<EvaluationModelResponse> {
        let test = Table::read_parquet(self.ingestion.test_file_path())?;
        let prepared = prepare_features(&test, &self.schema, self.config.current_year)?;

        let trained_model_f1_score = self.trainer.metric_artifact().f1_score;
        let best_model_f1_score = match self.get_best_model()? {
            Some(estimator) => {
                let y_hat = estimator.predict(&prepared.features)?;
                Some(f1_score(&prepared.labels, &y_hat))
            }
            None => {
                tracing::info!(
                    bucket = %self.config.bucket_name,
                    key = %self.config.model_key,
                    "No registered model, comparing against 0"
                );
                None
            }
        };

        let response =
            EvaluationModelResponse::compare(trained_model_f1_score, best_model_f1_score);
        tracing::info!(?response, "Evaluated model");
        Ok(response)
    }

    /// Run the evaluation
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Stage`] wrapping any failure. Rejection is not
    /// an error.
    pub fn initiate_model_evaluation(&self) -> Result<ModelEvaluationArtifact> {
        let _span = tracing::info_span!("model_evaluation").entered();

        let response = self.evaluate_model().stage(Stage::ModelEvaluation)?;
        let artifact = ModelEvaluationArtifact::new(
            response.is_model_accepted,
            &self.config.model_key,
            self.trainer.trained_model_file_path(),
            response.difference,
        );
        tracing::info!(?artifact, "Model evaluation artifact");
        Ok(artifact)
    }
}

impl std::fmt::Debug for ModelEvaluation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEvaluation")
            .field("config", &self.config)
            .field("ingestion", &self.ingestion)
            .field("trainer", &self.trainer)
            .finish_non_exhaustive()
    }
}
