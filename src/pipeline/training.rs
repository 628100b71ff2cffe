//! Training orchestrator
//!
//! `Ingest → Validate → Transform → Train → Evaluate → (accepted? Push : Stop)`

use crate::artifact::{
    DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelEvaluationArtifact, ModelPusherArtifact, ModelTrainerArtifact,
};
use crate::components::{
    DataIngestion, DataTransformation, DataValidation, ModelEvaluation, ModelPusher, ModelTrainer,
};
use crate::config::PipelineConfig;
use crate::error::{Stage, StageContext};
use crate::registry::ObjectStore;
use crate::schema::SchemaConfig;
use crate::source::DocumentStore;
use crate::tracking::RunTracker;
use crate::Result;

/// Artifacts of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Ingestion output
    pub ingestion: DataIngestionArtifact,
    /// Validation output
    pub validation: DataValidationArtifact,
    /// Transformation output
    pub transformation: DataTransformationArtifact,
    /// Trainer output
    pub trainer: ModelTrainerArtifact,
    /// Evaluation output
    pub evaluation: ModelEvaluationArtifact,
    /// Pusher output, present only when the model was accepted
    pub pusher: Option<ModelPusherArtifact>,
}

impl PipelineOutcome {
    /// Whether the trained model reached the registry
    #[must_use]
    pub const fn is_model_pushed(&self) -> bool {
        self.pusher.is_some()
    }
}

/// Runs every stage in order against one document store and one registry
pub struct TrainPipeline {
    config: PipelineConfig,
    documents: Box<dyn DocumentStore>,
    registry: Box<dyn ObjectStore>,
}

impl TrainPipeline {
    /// Pipeline reading from `documents` and publishing to `registry`
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        documents: Box<dyn DocumentStore>,
        registry: Box<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            documents,
            registry,
        }
    }

    /// Run settings
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registry the pipeline publishes to
    #[must_use]
    pub fn registry(&self) -> &dyn ObjectStore {
        self.registry.as_ref()
    }

    fn schema(&self, stage: Stage) -> Result<SchemaConfig> {
        SchemaConfig::from_yaml(self.config.schema_file_path()).stage(stage)
    }

    /// Export and split the collection
    ///
    /// # Errors
    ///
    /// See [`DataIngestion::initiate_data_ingestion`]
    pub fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        tracing::info!("Getting the data from the document store");
        DataIngestion::new(self.config.data_ingestion(), self.documents.as_ref())
            .initiate_data_ingestion()
    }

    /// Validate the splits
    ///
    /// # Errors
    ///
    /// See [`DataValidation::initiate_data_validation`]
    pub fn start_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        let schema = self.schema(Stage::DataValidation)?;
        DataValidation::new(ingestion.clone(), self.config.data_validation(), schema)
            .initiate_data_validation()
    }

    /// Transform the splits
    ///
    /// # Errors
    ///
    /// See [`DataTransformation::initiate_data_transformation`]
    pub fn start_data_transformation(
        &self,
        ingestion: &DataIngestionArtifact,
        validation: &DataValidationArtifact,
    ) -> Result<DataTransformationArtifact> {
        let schema = self.schema(Stage::DataTransformation)?;
        DataTransformation::new(
            ingestion.clone(),
            validation.clone(),
            self.config.data_transformation(),
            schema,
        )
        .initiate_data_transformation()
    }

    /// Search, score and save the model
    ///
    /// # Errors
    ///
    /// See [`ModelTrainer::initiate_model_trainer`]
    pub fn start_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelTrainerArtifact> {
        ModelTrainer::new(transformation.clone(), self.config.model_trainer())
            .initiate_model_trainer()
    }

    /// Compare against the registered model
    ///
    /// # Errors
    ///
    /// See [`ModelEvaluation::initiate_model_evaluation`]
    pub fn start_model_evaluation(
        &self,
        ingestion: &DataIngestionArtifact,
        trainer: &ModelTrainerArtifact,
    ) -> Result<ModelEvaluationArtifact> {
        let schema = self.schema(Stage::ModelEvaluation)?;
        ModelEvaluation::new(
            self.config.model_evaluation(),
            ingestion.clone(),
            trainer.clone(),
            schema,
            self.registry.as_ref(),
        )
        .initiate_model_evaluation()
    }

    /// Upload the accepted model
    ///
    /// # Errors
    ///
    /// See [`ModelPusher::initiate_model_pusher`]
    pub fn start_model_pusher(
        &self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<ModelPusherArtifact> {
        ModelPusher::new(evaluation.clone(), self.config.model_pusher(), self.registry.as_ref())
            .initiate_model_pusher()
    }

    /// Run every stage, pushing only an accepted model.
    ///
    /// The run manifest is written whether the run succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. A rejected model is not an error.
    pub fn run_pipeline(&self) -> Result<PipelineOutcome> {
        let _span = tracing::info_span!(
            "train_pipeline",
            pipeline = %self.config.pipeline_name(),
            run = %self.config.timestamp()
        )
        .entered();

        let mut tracker = RunTracker::new(
            self.config.timestamp(),
            self.config.pipeline_name(),
            self.config.run_manifest_path(),
        );
        tracker.start();

        match self.run_stages(&mut tracker) {
            Ok(outcome) => {
                tracker.complete();
                tracker.write_manifest()?;
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(error = %err, "Training pipeline failed");
                tracker.fail(&err);
                if let Err(write_err) = tracker.write_manifest() {
                    tracing::warn!(error = %write_err, "Could not write run manifest");
                }
                Err(err)
            }
        }
    }

    fn run_stages(&self, tracker: &mut RunTracker) -> Result<PipelineOutcome> {
        let ingestion = self.start_data_ingestion()?;
        tracker
            .log_artifact(Stage::DataIngestion, "train", ingestion.trained_file_path())
            .stage(Stage::DataIngestion)?;
        tracker
            .log_artifact(Stage::DataIngestion, "test", ingestion.test_file_path())
            .stage(Stage::DataIngestion)?;

        let validation = self.start_data_validation(&ingestion)?;
        tracker.log_metric(
            Stage::DataValidation,
            "validation_status",
            if validation.validation_status() { 1.0 } else { 0.0 },
        );
        if validation.drift_report_file_path().exists() {
            tracker
                .log_artifact(
                    Stage::DataValidation,
                    "drift_report",
                    validation.drift_report_file_path(),
                )
                .stage(Stage::DataValidation)?;
        }

        let transformation = self.start_data_transformation(&ingestion, &validation)?;
        tracker
            .log_artifact(
                Stage::DataTransformation,
                "preprocessor",
                transformation.transformed_object_file_path(),
            )
            .stage(Stage::DataTransformation)?;

        let trainer = self.start_model_trainer(&transformation)?;
        let metric = trainer.metric_artifact();
        tracker.log_metric(Stage::ModelTrainer, "f1_score", metric.f1_score);
        tracker.log_metric(Stage::ModelTrainer, "precision_score", metric.precision_score);
        tracker.log_metric(Stage::ModelTrainer, "recall_score", metric.recall_score);
        tracker
            .log_artifact(Stage::ModelTrainer, "trained_model", trainer.trained_model_file_path())
            .stage(Stage::ModelTrainer)?;

        let evaluation = self.start_model_evaluation(&ingestion, &trainer)?;
        tracker.log_metric(
            Stage::ModelEvaluation,
            "changed_accuracy",
            evaluation.changed_accuracy(),
        );

        let pusher = if evaluation.is_model_accepted() {
            Some(self.start_model_pusher(&evaluation)?)
        } else {
            tracing::info!("Model not accepted, skipping push");
            None
        };

        Ok(PipelineOutcome {
            ingestion,
            validation,
            transformation,
            trainer,
            evaluation,
            pusher,
        })
    }
}

impl std::fmt::Debug for TrainPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
