//! Pipeline-wide constants: names, file layout and default thresholds

/// Document-store database holding the visa records
pub const DATABASE_NAME: &str = "US_VISA";
/// Collection exported by ingestion
pub const COLLECTION_NAME: &str = "visa_data";

/// Pipeline name, recorded in run manifests
pub const PIPELINE_NAME: &str = "usvisa";
/// Root directory for per-run artifacts
pub const ARTIFACT_DIR: &str = "artifact";
/// Run directory timestamp format
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Environment key holding the document-store connection string
pub const DOCSTORE_URL_ENV_KEY: &str = "USVISA_DOCSTORE_URL";
/// Environment key holding the registry location
pub const REGISTRY_URL_ENV_KEY: &str = "USVISA_REGISTRY_URL";
/// Access key id for an S3-compatible registry endpoint
pub const REGISTRY_ACCESS_KEY_ID_ENV_KEY: &str = "USVISA_REGISTRY_ACCESS_KEY_ID";
/// Secret access key for an S3-compatible registry endpoint
pub const REGISTRY_SECRET_ACCESS_KEY_ENV_KEY: &str = "USVISA_REGISTRY_SECRET_ACCESS_KEY";
/// Optional signing region for an S3-compatible registry endpoint
pub const REGISTRY_REGION_ENV_KEY: &str = "USVISA_REGISTRY_REGION";
/// Optional override for the artifact root
pub const ARTIFACT_DIR_ENV_KEY: &str = "USVISA_ARTIFACT_DIR";
/// Optional override for the schema description path
pub const SCHEMA_PATH_ENV_KEY: &str = "USVISA_SCHEMA_PATH";
/// Optional override for the model search space path
pub const MODEL_CONFIG_PATH_ENV_KEY: &str = "USVISA_MODEL_CONFIG_PATH";

/// Schema description
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";
/// Model search space
pub const MODEL_CONFIG_FILE_PATH: &str = "config/model.yaml";

/// Label column
pub const TARGET_COLUMN: &str = "case_status";
/// Establishment-year column the age feature is derived from
pub const ESTABLISHMENT_YEAR_COLUMN: &str = "yr_of_estab";
/// Engineered feature: current year minus establishment year
pub const COMPANY_AGE_COLUMN: &str = "company_age";

/// Feature-store table name
pub const FILE_NAME: &str = "usvisa.parquet";
/// Train split file name
pub const TRAIN_FILE_NAME: &str = "train.parquet";
/// Test split file name
pub const TEST_FILE_NAME: &str = "test.parquet";
/// Bundled model file name (local and in the registry)
pub const MODEL_FILE_NAME: &str = "model.json";
/// Fitted preprocessor file name
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.json";
/// Run manifest file name
pub const RUN_MANIFEST_FILE_NAME: &str = "run.json";

/// Ingestion stage directory
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
/// Feature-store directory under ingestion
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
/// Split directory under ingestion
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
/// Fraction of rows held out for the test split
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;
/// Seed for the train/test shuffle
pub const DATA_INGESTION_SPLIT_SEED: u64 = 42;

/// Validation stage directory
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
/// Drift report directory under validation
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
/// Drift report file name
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";
/// Per-feature p-value below which a column counts as drifted
pub const DRIFT_P_VALUE_THRESHOLD: f64 = 0.05;
/// Share of drifted columns at which the whole dataset counts as drifted
pub const DATASET_DRIFT_SHARE: f64 = 0.5;

/// Transformation stage directory
pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
/// Transformed array directory
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
/// Fitted preprocessor directory
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";

/// Trainer stage directory
pub const MODEL_TRAINER_DIR_NAME: &str = "model_trainer";
/// Trained model directory under the trainer
pub const MODEL_TRAINER_TRAINED_MODEL_DIR: &str = "trained_model";
/// Minimum cross-validated score a candidate must reach
pub const MODEL_TRAINER_EXPECTED_SCORE: f64 = 0.6;

/// Registry bucket holding the production model
pub const MODEL_BUCKET_NAME: &str = "usvisa-model-registry";
/// Registry key of the production model
pub const MODEL_PUSHER_MODEL_KEY: &str = MODEL_FILE_NAME;
