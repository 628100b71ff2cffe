//! Preprocessor plus classifier, persisted as one object

use super::Classifier;
use crate::features::CaseStatus;
use crate::persist::object_from_slice;
use crate::preprocess::FittedPreprocessor;
use crate::storage::Table;
use crate::Result;
use serde::{Deserialize, Serialize};

/// The unit that is trained, evaluated, pushed and served
#[derive(Debug, Serialize, Deserialize)]
pub struct VisaModel {
    preprocessor: FittedPreprocessor,
    classifier: Classifier,
}

impl VisaModel {
    /// Bundle a fitted preprocessor with a fitted classifier
    #[must_use]
    pub const fn new(preprocessor: FittedPreprocessor, classifier: Classifier) -> Self {
        Self {
            preprocessor,
            classifier,
        }
    }

    /// Fitted preprocessor
    #[must_use]
    pub const fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    /// Fitted classifier
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Transform a feature table and predict integer labels.
    ///
    /// Columns the preprocessor does not use are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if required columns are missing or the transformed
    /// width does not match the classifier
    pub fn predict(&self, table: &Table) -> Result<Vec<usize>> {
        let transformed = self.preprocessor.transform(table)?;
        self.classifier.predict(transformed.view())
    }

    /// Like [`VisaModel::predict`], mapped to case statuses
    ///
    /// # Errors
    ///
    /// See [`VisaModel::predict`]
    pub fn predict_status(&self, table: &Table) -> Result<Vec<CaseStatus>> {
        self.predict(table)?
            .into_iter()
            .map(CaseStatus::from_label)
            .collect()
    }

    /// Serialized form, as stored in the registry
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Inverse of [`VisaModel::to_bytes`]
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a serialized model
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        object_from_slice(bytes)
    }
}
