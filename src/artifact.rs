//! Stage outputs
//!
//! Each stage returns one artifact naming the files it wrote, and the next
//! stage reads only what its predecessor's artifact names. Artifacts are
//! immutable once built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ingestion output: the train and test splits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    trained_file_path: PathBuf,
    test_file_path: PathBuf,
}

impl DataIngestionArtifact {
    /// Artifact for the written splits
    #[must_use]
    pub fn new(trained_file_path: impl Into<PathBuf>, test_file_path: impl Into<PathBuf>) -> Self {
        Self {
            trained_file_path: trained_file_path.into(),
            test_file_path: test_file_path.into(),
        }
    }

    /// Train split
    #[must_use]
    pub fn trained_file_path(&self) -> &Path {
        &self.trained_file_path
    }

    /// Test split
    #[must_use]
    pub fn test_file_path(&self) -> &Path {
        &self.test_file_path
    }
}

/// Validation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    validation_status: bool,
    message: String,
    drift_report_file_path: PathBuf,
}

impl DataValidationArtifact {
    /// Artifact for a finished validation
    #[must_use]
    pub fn new(
        validation_status: bool,
        message: impl Into<String>,
        drift_report_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            validation_status,
            message: message.into(),
            drift_report_file_path: drift_report_file_path.into(),
        }
    }

    /// Whether every check passed
    #[must_use]
    pub const fn validation_status(&self) -> bool {
        self.validation_status
    }

    /// Failure text, or the drift verdict when checks passed
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Drift report location (written only when checks passed)
    #[must_use]
    pub fn drift_report_file_path(&self) -> &Path {
        &self.drift_report_file_path
    }
}

/// Transformation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    transformed_object_file_path: PathBuf,
    transformed_train_file_path: PathBuf,
    transformed_test_file_path: PathBuf,
}

impl DataTransformationArtifact {
    /// Artifact for the written preprocessor and arrays
    #[must_use]
    pub fn new(
        transformed_object_file_path: impl Into<PathBuf>,
        transformed_train_file_path: impl Into<PathBuf>,
        transformed_test_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transformed_object_file_path: transformed_object_file_path.into(),
            transformed_train_file_path: transformed_train_file_path.into(),
            transformed_test_file_path: transformed_test_file_path.into(),
        }
    }

    /// Fitted preprocessor
    #[must_use]
    pub fn transformed_object_file_path(&self) -> &Path {
        &self.transformed_object_file_path
    }

    /// Train array, label in the last column
    #[must_use]
    pub fn transformed_train_file_path(&self) -> &Path {
        &self.transformed_train_file_path
    }

    /// Test array, label in the last column
    #[must_use]
    pub fn transformed_test_file_path(&self) -> &Path {
        &self.transformed_test_file_path
    }
}

/// Held-out scores of a trained model (positive class: `Denied`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetric {
    /// F1 score
    pub f1_score: f64,
    /// Precision
    pub precision_score: f64,
    /// Recall
    pub recall_score: f64,
}

/// Trainer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    trained_model_file_path: PathBuf,
    metric_artifact: ClassificationMetric,
}

impl ModelTrainerArtifact {
    /// Artifact for a saved model and its scores
    #[must_use]
    pub fn new(
        trained_model_file_path: impl Into<PathBuf>,
        metric_artifact: ClassificationMetric,
    ) -> Self {
        Self {
            trained_model_file_path: trained_model_file_path.into(),
            metric_artifact,
        }
    }

    /// Bundled model file
    #[must_use]
    pub fn trained_model_file_path(&self) -> &Path {
        &self.trained_model_file_path
    }

    /// Held-out scores
    #[must_use]
    pub const fn metric_artifact(&self) -> &ClassificationMetric {
        &self.metric_artifact
    }
}

/// Evaluation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    is_model_accepted: bool,
    registry_model_path: String,
    trained_model_path: PathBuf,
    changed_accuracy: f64,
}

impl ModelEvaluationArtifact {
    /// Artifact for a finished comparison
    #[must_use]
    pub fn new(
        is_model_accepted: bool,
        registry_model_path: impl Into<String>,
        trained_model_path: impl Into<PathBuf>,
        changed_accuracy: f64,
    ) -> Self {
        Self {
            is_model_accepted,
            registry_model_path: registry_model_path.into(),
            trained_model_path: trained_model_path.into(),
            changed_accuracy,
        }
    }

    /// Whether the trained model beat the registered one
    #[must_use]
    pub const fn is_model_accepted(&self) -> bool {
        self.is_model_accepted
    }

    /// Registry key the comparison used
    #[must_use]
    pub fn registry_model_path(&self) -> &str {
        &self.registry_model_path
    }

    /// Candidate model file
    #[must_use]
    pub fn trained_model_path(&self) -> &Path {
        &self.trained_model_path
    }

    /// Trained F1 minus registered F1 (0 if none registered)
    #[must_use]
    pub const fn changed_accuracy(&self) -> f64 {
        self.changed_accuracy
    }
}

/// Pusher output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    bucket_name: String,
    registry_model_path: String,
}

impl ModelPusherArtifact {
    /// Artifact for an upload
    #[must_use]
    pub fn new(bucket_name: impl Into<String>, registry_model_path: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            registry_model_path: registry_model_path.into(),
        }
    }

    /// Registry bucket
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Registry key written
    #[must_use]
    pub fn registry_model_path(&self) -> &str {
        &self.registry_model_path
    }
}
