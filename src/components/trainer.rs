//! Model trainer: search the model space, score, bundle and save

use crate::artifact::{ClassificationMetric, DataTransformationArtifact, ModelTrainerArtifact};
use crate::config::ModelTrainerConfig;
use crate::error::{Stage, StageContext};
use crate::features::detach_labels;
use crate::model::metrics::{accuracy_score, f1_score, precision_score, recall_score};
use crate::model::{BestModelDetail, ModelFactory, VisaModel};
use crate::persist::{load_array, load_object, save_object};
use crate::preprocess::FittedPreprocessor;
use crate::Result;
use ndarray::Array2;

/// Trainer stage
#[derive(Debug)]
pub struct ModelTrainer {
    transformation: DataTransformationArtifact,
    config: ModelTrainerConfig,
}

impl ModelTrainer {
    /// Train on the arrays named by `transformation`
    #[must_use]
    pub const fn new(
        transformation: DataTransformationArtifact,
        config: ModelTrainerConfig,
    ) -> Self {
        Self {
            transformation,
            config,
        }
    }

    /// Find the best model on `train` and score it on `test`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BelowExpectedScore`] if no candidate reaches
    /// the floor, or error if the model config is invalid
    pub fn get_model_object_and_report(
        &self,
        train: &Array2<f64>,
        test: &Array2<f64>,
    ) -> Result<(BestModelDetail, ClassificationMetric)> {
        let factory = ModelFactory::from_yaml(&self.config.model_config_file_path)?;
        let (x_train, y_train) = detach_labels(train)?;
        let (x_test, y_test) = detach_labels(test)?;

        let best = factory.get_best_model(
            x_train.view(),
            &y_train,
            self.config.expected_score,
            self.config.random_seed,
        )?;
        let y_pred = best.best_model.predict(x_test.view())?;

        let accuracy = accuracy_score(&y_test, &y_pred);
        let metric = ClassificationMetric {
            f1_score: f1_score(&y_test, &y_pred),
            precision_score: precision_score(&y_test, &y_pred),
            recall_score: recall_score(&y_test, &y_pred),
        };
        tracing::info!(
            model = %best.name,
            class = best.spec.class_name(),
            cv_score = best.best_score,
            accuracy,
            f1 = metric.f1_score,
            "Best model found"
        );
        Ok((best, metric))
    }

    /// Run the trainer and save the bundled model
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Stage`] wrapping the first failure, including
    /// a best score below the configured floor
    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        let _span = tracing::info_span!("model_trainer").entered();
        tracing::info!("Starting model trainer");

        let train = load_array(self.transformation.transformed_train_file_path())
            .stage(Stage::ModelTrainer)?;
        let test = load_array(self.transformation.transformed_test_file_path())
            .stage(Stage::ModelTrainer)?;

        let (best, metric) = self
            .get_model_object_and_report(&train, &test)
            .stage(Stage::ModelTrainer)?;

        let preprocessor: FittedPreprocessor =
            load_object(self.transformation.transformed_object_file_path())
                .stage(Stage::ModelTrainer)?;
        let model = VisaModel::new(preprocessor, best.best_model);
        save_object(&self.config.trained_model_file_path, &model).stage(Stage::ModelTrainer)?;
        tracing::info!(
            path = %self.config.trained_model_file_path.display(),
            "Saved bundled model"
        );

        Ok(ModelTrainerArtifact::new(&self.config.trained_model_file_path, metric))
    }
}
