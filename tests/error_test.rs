//! Tests for error types

use visa_pipeline::{Error, Stage, StageContext};

#[test]
fn test_empty_dataset_error() {
    let error = Error::EmptyDataset {
        collection: "visa_data".to_string(),
    };
    assert_eq!(format!("{error}"), "No data found in collection 'visa_data'");
}

#[test]
fn test_validation_failed_error() {
    let error = Error::ValidationFailed("Columns are missing in the test dataframe. ".to_string());
    let error_str = format!("{error}");
    assert!(error_str.starts_with("Data validation failed"));
    assert!(error_str.contains("test dataframe"));
}

#[test]
fn test_below_expected_score_error() {
    let error = Error::BelowExpectedScore {
        best_score: 0.5512,
        expected: 0.6,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("No best model found with score more than base score"));
    assert!(error_str.contains("0.5512"));
    assert!(error_str.contains("0.6000"));
}

#[test]
fn test_registry_error() {
    let error = Error::Registry("bucket not found".to_string());
    assert_eq!(format!("{error}"), "Registry error: bucket not found");
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_stage_error_carries_cause_and_location() {
    let result: Result<(), Error> = Err(Error::Schema("column b missing".to_string()));
    let line = line!() + 1;
    let error = result.stage(Stage::DataValidation).unwrap_err();

    let error_str = format!("{error}");
    assert!(error_str.starts_with("data_validation stage failed at"));
    assert!(error_str.contains(&format!("error_test.rs:{line}")));
    assert!(error_str.ends_with("Schema error: column b missing"));

    assert_eq!(error.stage(), Some(Stage::DataValidation));
    assert!(matches!(error.root_cause(), Error::Schema(_)));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_innermost_stage_wins() {
    let inner = Err::<(), _>(Error::Model("no candidates".to_string()))
        .stage(Stage::ModelTrainer);
    let outer = inner.stage(Stage::ModelEvaluation).unwrap_err();
    assert_eq!(outer.stage(), Some(Stage::ModelTrainer));
}

#[test]
fn test_foreign_errors_are_wrapped() {
    let parse = serde_json::from_str::<serde_json::Value>("{").map(|_| ());
    let error = parse.stage(Stage::Prediction).unwrap_err();
    assert_eq!(error.stage(), Some(Stage::Prediction));
    assert!(matches!(error.root_cause(), Error::Json(_)));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> visa_pipeline::Result<i32> {
        Err(Error::Other("test error".to_string()))
    }

    assert!(returns_error().is_err());
}
