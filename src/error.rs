//! Error types for the visa training pipeline
//!
//! Every public stage operation translates its failure into [`Error::Stage`],
//! which keeps the original cause and the source location of the boundary
//! where the failure left the stage.

use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Pull records from the document store and split them
    DataIngestion,
    /// Schema checks and drift detection
    DataValidation,
    /// Feature engineering, encoding and resampling
    DataTransformation,
    /// Model search and fitting
    ModelTrainer,
    /// Comparison against the registered model
    ModelEvaluation,
    /// Upload to the registry
    ModelPusher,
    /// Inference with the registered model
    Prediction,
}

impl Stage {
    /// Stable snake-case name, used in logs and run manifests
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DataIngestion => "data_ingestion",
            Self::DataValidation => "data_validation",
            Self::DataTransformation => "data_transformation",
            Self::ModelTrainer => "model_trainer",
            Self::ModelEvaluation => "model_evaluation",
            Self::ModelPusher => "model_pusher",
            Self::Prediction => "prediction",
        }
    }

    /// Position of the stage in a training run (prediction sorts last)
    #[must_use]
    pub const fn ordinal(self) -> u64 {
        match self {
            Self::DataIngestion => 0,
            Self::DataValidation => 1,
            Self::DataTransformation => 2,
            Self::ModelTrainer => 3,
            Self::ModelEvaluation => 4,
            Self::ModelPusher => 5,
            Self::Prediction => 6,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline error types
#[derive(Error, Debug)]
pub enum Error {
    /// The document store returned no records
    #[error("No data found in collection '{collection}'")]
    EmptyDataset {
        /// Collection that was exported
        collection: String,
    },

    /// Data validation did not pass; carries the validation message
    #[error("Data validation failed: {0}")]
    ValidationFailed(String),

    /// No model candidate reached the configured score floor
    #[error(
        "No best model found with score more than base score: \
         best {best_score:.4} < expected {expected:.4}"
    )]
    BelowExpectedScore {
        /// Best cross-validated score among all candidates
        best_score: f64,
        /// Configured floor
        expected: f64,
    },

    /// Schema description or table shape mismatch
    #[error("Schema error: {0}")]
    Schema(String),

    /// Storage error (Parquet/Arrow tables, persisted objects)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Model registry (object storage) failure
    #[error("Registry error: {0}")]
    Registry(String),

    /// Document store failure
    #[error("Document store error: {0}")]
    DocumentStore(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input to an operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model fitting or prediction failure
    #[error("Model error: {0}")]
    Model(String),

    /// A stage boundary translated an underlying failure
    #[error("{stage} stage failed at {location}: {source}")]
    Stage {
        /// Stage whose public operation failed
        stage: Stage,
        /// Source location of the boundary
        location: &'static Location<'static>,
        /// Original cause
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Array shape mismatch
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Original cause, looking through stage wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Stage that reported the error, if it crossed a stage boundary
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attach stage context to a fallible result at a stage boundary
pub trait StageContext<T> {
    /// Wrap the error in [`Error::Stage`], recording the caller's location.
    ///
    /// Errors that already crossed a stage boundary are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error if `self` is an error
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<Error>> StageContext<T> for std::result::Result<T, E> {
    #[track_caller]
    fn stage(self, stage: Stage) -> Result<T> {
        let location = Location::caller();
        self.map_err(|err| match err.into() {
            wrapped @ Error::Stage { .. } => wrapped,
            source => Error::Stage {
                stage,
                location,
                source: Box::new(source),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wraps_with_location() {
        let result: Result<()> = Err(Error::Other("boom".to_string()));
        let err = result.stage(Stage::DataIngestion).unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("data_ingestion stage failed at"));
        assert!(message.contains("error.rs"));
        assert!(message.ends_with("boom"));
        assert_eq!(err.stage(), Some(Stage::DataIngestion));
    }

    #[test]
    fn test_stage_keeps_innermost_boundary() {
        let inner: Result<()> = Err(Error::Other("inner".to_string()));
        let inner = inner.stage(Stage::ModelTrainer);
        let outer = inner.stage(Stage::DataIngestion).unwrap_err();

        assert_eq!(outer.stage(), Some(Stage::ModelTrainer));
    }

    #[test]
    fn test_root_cause_unwraps() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.stage(Stage::ModelPusher).unwrap_err();
        assert!(matches!(err.root_cause(), Error::Io(_)));
    }

    #[test]
    fn test_stage_ordinals_follow_run_order() {
        let stages = [
            Stage::DataIngestion,
            Stage::DataValidation,
            Stage::DataTransformation,
            Stage::ModelTrainer,
            Stage::ModelEvaluation,
            Stage::ModelPusher,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].ordinal() < pair[1].ordinal());
        }
    }
}
