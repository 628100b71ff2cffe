//! Registered production model, loaded on first use

use super::ObjectStore;
use crate::model::VisaModel;
use crate::storage::Table;
use crate::{Error, Result};
use std::path::Path;
use std::sync::OnceLock;

/// The model stored under one registry key.
///
/// Store failures propagate; only a missing object counts as "no model".
pub struct RegistryEstimator<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    model_key: String,
    loaded: OnceLock<VisaModel>,
}

impl<'a> RegistryEstimator<'a> {
    /// Estimator for `bucket/model_key`
    #[must_use]
    pub fn new(
        store: &'a dyn ObjectStore,
        bucket: impl Into<String>,
        model_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            model_key: model_key.into(),
            loaded: OnceLock::new(),
        }
    }

    /// Registry bucket
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Registry key
    #[must_use]
    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    /// Whether a model is registered under the key
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be queried
    pub fn is_model_present(&self) -> Result<bool> {
        self.store.exists(&self.bucket, &self.model_key)
    }

    /// Download and decode the registered model
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if nothing is registered, or a decode error
    pub fn load_model(&self) -> Result<VisaModel> {
        let bytes = self.store.get(&self.bucket, &self.model_key)?.ok_or_else(|| {
            Error::Registry(format!(
                "No model registered at {}/{}",
                self.bucket, self.model_key
            ))
        })?;
        VisaModel::from_bytes(&bytes)
    }

    /// Upload a model file under the key, replacing any registered model
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the upload fails
    pub fn save_model(&self, from_file: &Path) -> Result<()> {
        let bytes = std::fs::read(from_file).map_err(|e| {
            Error::Registry(format!("Failed to read model file {}: {e}", from_file.display()))
        })?;
        self.store.put(&self.bucket, &self.model_key, bytes)?;
        tracing::info!(bucket = %self.bucket, key = %self.model_key, "Uploaded model to registry");
        Ok(())
    }

    fn model(&self) -> Result<&VisaModel> {
        if let Some(model) = self.loaded.get() {
            return Ok(model);
        }
        let model = self.load_model()?;
        Ok(self.loaded.get_or_init(|| model))
    }

    /// Predict labels with the registered model, downloading it once
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot be loaded or prediction fails
    pub fn predict(&self, table: &Table) -> Result<Vec<usize>> {
        self.model()?.predict(table)
    }
}

impl std::fmt::Debug for RegistryEstimator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEstimator")
            .field("bucket", &self.bucket)
            .field("model_key", &self.model_key)
            .field("loaded", &self.loaded.get().is_some())
            .finish_non_exhaustive()
    }
}
