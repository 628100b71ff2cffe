//! Model pusher: upload the accepted model to the registry

use crate::artifact::{ModelEvaluationArtifact, ModelPusherArtifact};
use crate::config::ModelPusherConfig;
use crate::error::{Stage, StageContext};
use crate::registry::{ObjectStore, RegistryEstimator};
use crate::Result;

/// Pusher stage
pub struct ModelPusher<'a> {
    evaluation: ModelEvaluationArtifact,
    config: ModelPusherConfig,
    estimator: RegistryEstimator<'a>,
}

impl<'a> ModelPusher<'a> {
    /// Push the model named by `evaluation` into `store`
    #[must_use]
    pub fn new(
        evaluation: ModelEvaluationArtifact,
        config: ModelPusherConfig,
        store: &'a dyn ObjectStore,
    ) -> Self {
        let estimator = RegistryEstimator::new(store, &config.bucket_name, &config.model_key);
        Self {
            evaluation,
            config,
            estimator,
        }
    }

    /// Upload the trained model file
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Stage`] if the file cannot be read or the
    /// upload fails
    pub fn initiate_model_pusher(&self) -> Result<ModelPusherArtifact> {
        let _span = tracing::info_span!("model_pusher").entered();
        tracing::info!("Uploading artifacts folder to registry");

        self.estimator
            .save_model(self.evaluation.trained_model_path())
            .stage(Stage::ModelPusher)?;

        let artifact = ModelPusherArtifact::new(&self.config.bucket_name, &self.config.model_key);
        tracing::info!(?artifact, "Model pusher artifact");
        Ok(artifact)
    }
}

impl std::fmt::Debug for ModelPusher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPusher")
            .field("evaluation", &self.evaluation)
            .field("config", &self.config)
            .field("estimator", &self.estimator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryObjectStore;

    fn config() -> ModelPusherConfig {
        ModelPusherConfig {
            bucket_name: "usvisa-model-registry".to_string(),
            model_key: "model.json".to_string(),
        }
    }

    #[test]
    fn test_push_uploads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{}").unwrap();
        let store = MemoryObjectStore::new();

        let evaluation = ModelEvaluationArtifact::new(true, "model.json", &path, 0.1);
        let artifact = ModelPusher::new(evaluation, config(), &store)
            .initiate_model_pusher()
            .unwrap();

        assert_eq!(artifact.bucket_name(), "usvisa-model-registry");
        assert_eq!(artifact.registry_model_path(), "model.json");
        assert_eq!(store.get("usvisa-model-registry", "model.json").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_missing_model_file_fails() {
        let store = MemoryObjectStore::new();
        let evaluation =
            ModelEvaluationArtifact::new(true, "model.json", "/nonexistent/model.json", 0.1);
        let err = ModelPusher::new(evaluation, config(), &store)
            .initiate_model_pusher()
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::ModelPusher));
        assert!(store.is_empty());
    }
}
