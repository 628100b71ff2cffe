//! Pipeline configuration
//!
//! [`PipelineConfig`] holds the run-wide settings and derives one config per
//! stage. All stage paths live under `<artifact_root>/<timestamp>/`, so every
//! run writes into its own directory.
//!
//! ```rust
//! use visa_pipeline::config::PipelineConfig;
//!
//! let config = PipelineConfig::builder()
//!     .artifact_root("/tmp/usvisa-artifacts")
//!     .timestamp("01_02_2026_03_04_05")
//!     .current_year(2026)
//!     .build();
//!
//! let ingestion = config.data_ingestion();
//! assert!(ingestion.training_file_path.ends_with("ingested/train.parquet"));
//! ```

use crate::constants::{
    ARTIFACT_DIR, ARTIFACT_DIR_ENV_KEY, COLLECTION_NAME, DATABASE_NAME,
    DATASET_DRIFT_SHARE, DATA_INGESTION_DIR_NAME, DATA_INGESTION_FEATURE_STORE_DIR,
    DATA_INGESTION_INGESTED_DIR, DATA_INGESTION_SPLIT_SEED,
    DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO, DATA_TRANSFORMATION_DIR_NAME,
    DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR, DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR,
    DATA_VALIDATION_DIR_NAME, DATA_VALIDATION_DRIFT_REPORT_DIR,
    DATA_VALIDATION_DRIFT_REPORT_FILE_NAME, DRIFT_P_VALUE_THRESHOLD, FILE_NAME,
    MODEL_BUCKET_NAME, MODEL_CONFIG_FILE_PATH, MODEL_CONFIG_PATH_ENV_KEY, MODEL_FILE_NAME,
    MODEL_PUSHER_MODEL_KEY, MODEL_TRAINER_DIR_NAME, MODEL_TRAINER_EXPECTED_SCORE,
    MODEL_TRAINER_TRAINED_MODEL_DIR, PIPELINE_NAME, PREPROCESSING_OBJECT_FILE_NAME,
    RUN_MANIFEST_FILE_NAME, SCHEMA_FILE_PATH, SCHEMA_PATH_ENV_KEY, TEST_FILE_NAME,
    TIMESTAMP_FORMAT, TRAIN_FILE_NAME,
};
use crate::{Error, Result};
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// How validation compares the schema against a table's size.
///
/// The historical check compares the number of declared schema entries with
/// the table's *row* count. Comparing against the column count is available
/// but must be chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnCountRule {
    /// Declared schema entries == table rows
    #[default]
    SchemaEntriesVsRows,
    /// Declared schema entries == table columns
    SchemaEntriesVsColumns,
}

/// Run-wide pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pipeline_name: String,
    artifact_root: PathBuf,
    timestamp: String,
    schema_file_path: PathBuf,
    model_config_file_path: PathBuf,
    database_name: String,
    collection_name: String,
    train_test_split_ratio: f64,
    random_seed: u64,
    expected_score: f64,
    current_year: i32,
    bucket_name: String,
    model_key: String,
    column_count_rule: ColumnCountRule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfigBuilder::new().build()
    }
}

impl PipelineConfig {
    /// Create a builder with defaults from [`crate::constants`]
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Defaults, with paths overridden by `USVISA_ARTIFACT_DIR`,
    /// `USVISA_SCHEMA_PATH` and `USVISA_MODEL_CONFIG_PATH` when set
    #[must_use]
    pub fn from_env() -> Self {
        let mut builder = Self::builder();
        if let Ok(dir) = std::env::var(ARTIFACT_DIR_ENV_KEY) {
            builder = builder.artifact_root(dir);
        }
        if let Ok(path) = std::env::var(SCHEMA_PATH_ENV_KEY) {
            builder = builder.schema_file_path(path);
        }
        if let Ok(path) = std::env::var(MODEL_CONFIG_PATH_ENV_KEY) {
            builder = builder.model_config_file_path(path);
        }
        builder.build()
    }

    /// Pipeline name
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Run timestamp (directory name)
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `<artifact_root>/<timestamp>`
    #[must_use]
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_root.join(&self.timestamp)
    }

    /// Run manifest path inside the run directory
    #[must_use]
    pub fn run_manifest_path(&self) -> PathBuf {
        self.artifact_dir().join(RUN_MANIFEST_FILE_NAME)
    }

    /// Schema description path
    #[must_use]
    pub fn schema_file_path(&self) -> &Path {
        &self.schema_file_path
    }

    /// Model search space path
    #[must_use]
    pub fn model_config_file_path(&self) -> &Path {
        &self.model_config_file_path
    }

    /// Year used to derive company age
    #[must_use]
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Seed shared by the split, resampling and model search
    #[must_use]
    pub const fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// Ingestion settings
    #[must_use]
    pub fn data_ingestion(&self) -> DataIngestionConfig {
        let dir = self.artifact_dir().join(DATA_INGESTION_DIR_NAME);
        DataIngestionConfig {
            feature_store_file_path: dir.join(DATA_INGESTION_FEATURE_STORE_DIR).join(FILE_NAME),
            training_file_path: dir.join(DATA_INGESTION_INGESTED_DIR).join(TRAIN_FILE_NAME),
            test_file_path: dir.join(DATA_INGESTION_INGESTED_DIR).join(TEST_FILE_NAME),
            data_ingestion_dir: dir,
            train_test_split_ratio: self.train_test_split_ratio,
            split_seed: self.random_seed,
            database_name: self.database_name.clone(),
            collection_name: self.collection_name.clone(),
        }
    }

    /// Validation settings
    #[must_use]
    pub fn data_validation(&self) -> DataValidationConfig {
        let dir = self.artifact_dir().join(DATA_VALIDATION_DIR_NAME);
        DataValidationConfig {
            drift_report_file_path: dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            data_validation_dir: dir,
            column_count_rule: self.column_count_rule,
            drift_p_value_threshold: DRIFT_P_VALUE_THRESHOLD,
            dataset_drift_share: DATASET_DRIFT_SHARE,
        }
    }

    /// Transformation settings
    #[must_use]
    pub fn data_transformation(&self) -> DataTransformationConfig {
        let dir = self.artifact_dir().join(DATA_TRANSFORMATION_DIR_NAME);
        let data_dir = dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        DataTransformationConfig {
            transformed_train_file_path: data_dir.join(TRAIN_FILE_NAME),
            transformed_test_file_path: data_dir.join(TEST_FILE_NAME),
            transformed_object_file_path: dir
                .join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR)
                .join(PREPROCESSING_OBJECT_FILE_NAME),
            data_transformation_dir: dir,
            current_year: self.current_year,
            random_seed: self.random_seed,
        }
    }

    /// Trainer settings
    #[must_use]
    pub fn model_trainer(&self) -> ModelTrainerConfig {
        let dir = self.artifact_dir().join(MODEL_TRAINER_DIR_NAME);
        ModelTrainerConfig {
            trained_model_file_path: dir
                .join(MODEL_TRAINER_TRAINED_MODEL_DIR)
                .join(MODEL_FILE_NAME),
            model_trainer_dir: dir,
            expected_score: self.expected_score,
            model_config_file_path: self.model_config_file_path.clone(),
            random_seed: self.random_seed,
        }
    }

    /// Evaluation settings
    #[must_use]
    pub fn model_evaluation(&self) -> ModelEvaluationConfig {
        ModelEvaluationConfig {
            bucket_name: self.bucket_name.clone(),
            model_key: self.model_key.clone(),
            current_year: self.current_year,
        }
    }

    /// Pusher settings
    #[must_use]
    pub fn model_pusher(&self) -> ModelPusherConfig {
        ModelPusherConfig {
            bucket_name: self.bucket_name.clone(),
            model_key: self.model_key.clone(),
        }
    }

    /// Prediction settings
    #[must_use]
    pub fn predictor(&self) -> PredictorConfig {
        PredictorConfig {
            bucket_name: self.bucket_name.clone(),
            model_key: self.model_key.clone(),
        }
    }
}

/// Builder for `PipelineConfig`.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a builder with defaults; the timestamp and current year come
    /// from the local clock.
    #[must_use]
    pub fn new() -> Self {
        let now = Local::now();
        Self {
            config: PipelineConfig {
                pipeline_name: PIPELINE_NAME.to_string(),
                artifact_root: PathBuf::from(ARTIFACT_DIR),
                timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
                schema_file_path: PathBuf::from(SCHEMA_FILE_PATH),
                model_config_file_path: PathBuf::from(MODEL_CONFIG_FILE_PATH),
                database_name: DATABASE_NAME.to_string(),
                collection_name: COLLECTION_NAME.to_string(),
                train_test_split_ratio: DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
                random_seed: DATA_INGESTION_SPLIT_SEED,
                expected_score: MODEL_TRAINER_EXPECTED_SCORE,
                current_year: now.year(),
                bucket_name: MODEL_BUCKET_NAME.to_string(),
                model_key: MODEL_PUSHER_MODEL_KEY.to_string(),
                column_count_rule: ColumnCountRule::default(),
            },
        }
    }

    /// Set the artifact root directory
    #[must_use]
    pub fn artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.artifact_root = root.into();
        self
    }

    /// Set the run timestamp (run directory name)
    #[must_use]
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.config.timestamp = timestamp.into();
        self
    }

    /// Set the schema description path
    #[must_use]
    pub fn schema_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_file_path = path.into();
        self
    }

    /// Set the model search space path
    #[must_use]
    pub fn model_config_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model_config_file_path = path.into();
        self
    }

    /// Set the document-store database name
    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.config.database_name = name.into();
        self
    }

    /// Set the collection to export
    #[must_use]
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Set the test-split fraction
    #[must_use]
    pub const fn train_test_split_ratio(mut self, ratio: f64) -> Self {
        self.config.train_test_split_ratio = ratio;
        self
    }

    /// Set the seed for splitting, resampling and model search
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Set the minimum acceptable model score
    #[must_use]
    pub const fn expected_score(mut self, score: f64) -> Self {
        self.config.expected_score = score;
        self
    }

    /// Set the year used for the company-age feature
    #[must_use]
    pub const fn current_year(mut self, year: i32) -> Self {
        self.config.current_year = year;
        self
    }

    /// Set the registry bucket
    #[must_use]
    pub fn bucket_name(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket_name = bucket.into();
        self
    }

    /// Set the registry key of the production model
    #[must_use]
    pub fn model_key(mut self, key: impl Into<String>) -> Self {
        self.config.model_key = key.into();
        self
    }

    /// Choose how validation compares the schema against table size
    #[must_use]
    pub const fn column_count_rule(mut self, rule: ColumnCountRule) -> Self {
        self.config.column_count_rule = rule;
        self
    }

    /// Build the `PipelineConfig`.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Ingestion settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataIngestionConfig {
    /// Stage directory
    pub data_ingestion_dir: PathBuf,
    /// Full exported table
    pub feature_store_file_path: PathBuf,
    /// Train split
    pub training_file_path: PathBuf,
    /// Test split
    pub test_file_path: PathBuf,
    /// Fraction of rows in the test split
    pub train_test_split_ratio: f64,
    /// Shuffle seed
    pub split_seed: u64,
    /// Document-store database
    pub database_name: String,
    /// Document-store collection
    pub collection_name: String,
}

/// Validation settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidationConfig {
    /// Stage directory
    pub data_validation_dir: PathBuf,
    /// Drift report (YAML)
    pub drift_report_file_path: PathBuf,
    /// Schema size comparison
    pub column_count_rule: ColumnCountRule,
    /// Per-feature p-value threshold
    pub drift_p_value_threshold: f64,
    /// Drifted-feature share that flags the dataset
    pub dataset_drift_share: f64,
}

/// Transformation settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataTransformationConfig {
    /// Stage directory
    pub data_transformation_dir: PathBuf,
    /// Transformed train array
    pub transformed_train_file_path: PathBuf,
    /// Transformed test array
    pub transformed_test_file_path: PathBuf,
    /// Fitted preprocessor
    pub transformed_object_file_path: PathBuf,
    /// Year used to derive company age
    pub current_year: i32,
    /// Resampling seed
    pub random_seed: u64,
}

/// Trainer settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTrainerConfig {
    /// Stage directory
    pub model_trainer_dir: PathBuf,
    /// Bundled model output
    pub trained_model_file_path: PathBuf,
    /// Score floor
    pub expected_score: f64,
    /// Model search space
    pub model_config_file_path: PathBuf,
    /// Model search seed
    pub random_seed: u64,
}

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEvaluationConfig {
    /// Registry bucket
    pub bucket_name: String,
    /// Registry key of the production model
    pub model_key: String,
    /// Year used to derive company age
    pub current_year: i32,
}

/// Pusher settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPusherConfig {
    /// Registry bucket
    pub bucket_name: String,
    /// Registry key the model is uploaded to
    pub model_key: String,
}

/// Prediction settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorConfig {
    /// Registry bucket
    pub bucket_name: String,
    /// Registry key of the production model
    pub model_key: String,
}

/// Resolve a store connection string to a local directory.
///
/// Accepts `file://` URLs and bare paths.
///
/// # Errors
///
/// Returns [`Error::Config`] for empty strings and unsupported schemes
pub fn store_location(url: &str) -> Result<PathBuf> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Config("Store location is empty".to_string()));
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some((scheme, _)) = url.split_once("://") {
        return Err(Error::Config(format!(
            "Unsupported store scheme '{scheme}' in '{url}'"
        )));
    }
    Ok(PathBuf::from(url))
}

/// Read a required environment variable holding a store location
///
/// # Errors
///
/// Returns [`Error::Config`] if the variable is unset or malformed
pub fn store_location_from_env(key: &str) -> Result<PathBuf> {
    let url = std::env::var(key)
        .map_err(|_| Error::Config(format!("Environment variable: {key} is not set.")))?;
    store_location(&url)
}
