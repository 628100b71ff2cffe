//! End-to-end training runs against in-memory stores

mod common;

use common::{document_store, pipeline_config, visa_documents, CURRENT_YEAR};
use visa_pipeline::config::ColumnCountRule;
use visa_pipeline::features::{prepare_features, CaseStatus};
use visa_pipeline::model::{ModelSpec, Params, VisaModel};
use visa_pipeline::pipeline::{TrainPipeline, VisaApplication, VisaClassifier};
use visa_pipeline::preprocess::PreprocessorPlan;
use visa_pipeline::registry::{MemoryObjectStore, ObjectStore};
use visa_pipeline::schema::SchemaConfig;
use visa_pipeline::storage::Table;
use visa_pipeline::tracking::{RunManifest, RunStatus};
use visa_pipeline::{Error, Stage};

fn pipeline(root: &std::path::Path, rule: ColumnCountRule, expected_score: f64) -> TrainPipeline {
    TrainPipeline::new(
        pipeline_config(root, rule, expected_score),
        Box::new(document_store(visa_documents(300, 7))),
        Box::new(MemoryObjectStore::new()),
    )
}

#[test]
fn test_first_run_pushes_model() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), ColumnCountRule::SchemaEntriesVsColumns, 0.5);

    let outcome = pipeline.run_pipeline().unwrap();

    assert_eq!(
        Table::read_parquet(outcome.ingestion.test_file_path()).unwrap().num_rows(),
        60
    );
    assert!(outcome.validation.validation_status());
    assert!(outcome.validation.message().starts_with("Drift"));
    assert!(outcome.transformation.transformed_object_file_path().exists());
    assert!(outcome.trainer.metric_artifact().f1_score > 0.0);

    // Nothing registered yet: the comparison baseline is 0
    assert!(outcome.evaluation.is_model_accepted());
    assert!(
        (outcome.evaluation.changed_accuracy() - outcome.trainer.metric_artifact().f1_score).abs()
            < 1e-12
    );

    let pushed = outcome.pusher.as_ref().unwrap();
    let config = pipeline.config();
    assert_eq!(pushed.registry_model_path(), config.model_pusher().model_key);
    let registered = pipeline
        .registry()
        .get(pushed.bucket_name(), pushed.registry_model_path())
        .unwrap()
        .unwrap();
    assert_eq!(registered, std::fs::read(outcome.trainer.trained_model_file_path()).unwrap());

    let manifest = RunManifest::load(config.run_manifest_path()).unwrap();
    assert_eq!(manifest.run.status(), RunStatus::Success);
    assert_eq!(manifest.metric("f1_score"), Some(outcome.trainer.metric_artifact().f1_score));
    assert!(manifest.artifacts.iter().any(|a| a.key() == "trained_model"));
}

#[test]
fn test_registered_model_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), ColumnCountRule::SchemaEntriesVsColumns, 0.5);
    pipeline.run_pipeline().unwrap();

    let classifier = VisaClassifier::new(&pipeline.config().predictor(), pipeline.registry());
    let application = VisaApplication {
        continent: "Asia".to_string(),
        education_of_employee: "Doctorate".to_string(),
        has_job_experience: "Y".to_string(),
        requires_job_training: "N".to_string(),
        no_of_employees: 2_000,
        region_of_employment: "West".to_string(),
        prevailing_wage: 120_000.0,
        unit_of_wage: "Year".to_string(),
        full_time_position: "Y".to_string(),
        company_age: 30,
    };
    let status = classifier.predict_application(&application).unwrap();
    assert!(matches!(status, CaseStatus::Certified | CaseStatus::Denied));
}

#[test]
fn test_better_registered_model_blocks_push() {
    let dir = tempfile::tempdir().unwrap();
    let documents = visa_documents(300, 7);

    // An unpruned tree over every record reproduces every label: F1 = 1
    let schema = SchemaConfig::from_yaml(common::schema_path()).unwrap();
    let table = Table::from_documents(&documents).unwrap();
    let prepared = prepare_features(&table, &schema, CURRENT_YEAR).unwrap();
    let (preprocessor, x) = PreprocessorPlan::from_schema(&schema)
        .fit_transform(&prepared.features)
        .unwrap();
    let classifier = ModelSpec::from_params("DecisionTreeClassifier", &Params::new())
        .unwrap()
        .fit(x.view(), &prepared.labels, 42)
        .unwrap();
    let perfect = VisaModel::new(preprocessor, classifier);

    let config = pipeline_config(dir.path(), ColumnCountRule::SchemaEntriesVsColumns, 0.5);
    let registry = MemoryObjectStore::new();
    let evaluation = config.model_evaluation();
    registry
        .put(&evaluation.bucket_name, &evaluation.model_key, perfect.to_bytes().unwrap())
        .unwrap();

    let documents = Box::new(common::document_store(documents));
    let pipeline = TrainPipeline::new(config, documents, Box::new(registry));
    let outcome = pipeline.run_pipeline().unwrap();

    assert!(!outcome.evaluation.is_model_accepted());
    assert!(outcome.evaluation.changed_accuracy() <= 0.0);
    assert!(outcome.pusher.is_none());
    let still_registered = pipeline
        .registry()
        .get(&evaluation.bucket_name, &evaluation.model_key)
        .unwrap()
        .unwrap();
    assert_eq!(still_registered, perfect.to_bytes().unwrap());
}

#[test]
fn test_score_floor_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), ColumnCountRule::SchemaEntriesVsColumns, 1.01);

    let err = pipeline.run_pipeline().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ModelTrainer));
    assert!(matches!(err.root_cause(), Error::BelowExpectedScore { .. }));
    assert!(!pipeline.config().model_trainer().trained_model_file_path.exists());
    assert!(pipeline.registry().get("usvisa-model-registry", "model.json").unwrap().is_none());

    let manifest = RunManifest::load(pipeline.config().run_manifest_path()).unwrap();
    assert_eq!(manifest.run.status(), RunStatus::Failed);
    assert_eq!(manifest.run.failed_stage(), Some("model_trainer"));
}

#[test]
fn test_failed_validation_gates_transformation() {
    let dir = tempfile::tempdir().unwrap();
    // The row-count rule cannot match a 240-row training split
    let pipeline = pipeline(dir.path(), ColumnCountRule::SchemaEntriesVsRows, 0.5);

    let err = pipeline.run_pipeline().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::DataTransformation));
    match err.root_cause() {
        Error::ValidationFailed(message) => {
            assert!(message.contains("Columns are missing in the training dataframe."));
        }
        other => panic!("unexpected error: {other}"),
    }
    let transformation = pipeline.config().data_transformation();
    assert!(!transformation.transformed_object_file_path.exists());
    assert!(!transformation.transformed_train_file_path.exists());
}

#[test]
fn test_empty_collection_writes_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = TrainPipeline::new(
        pipeline_config(dir.path(), ColumnCountRule::SchemaEntriesVsColumns, 0.5),
        Box::new(document_store(Vec::new())),
        Box::new(MemoryObjectStore::new()),
    );

    let err = pipeline.run_pipeline().unwrap_err();

    assert_eq!(err.stage(), Some(Stage::DataIngestion));
    assert!(matches!(err.root_cause(), Error::EmptyDataset { .. }));
    let ingestion = pipeline.config().data_ingestion();
    assert!(!ingestion.data_ingestion_dir.exists());

    let manifest = RunManifest::load(pipeline.config().run_manifest_path()).unwrap();
    assert_eq!(manifest.run.failed_stage(), Some("data_ingestion"));
}
