//! Saved objects reload equal to what was saved

mod common;

use common::{visa_documents, CURRENT_YEAR};
use visa_pipeline::features::prepare_features;
use visa_pipeline::model::{ModelSpec, Params, ParamValue, VisaModel};
use visa_pipeline::persist::{load_array, load_object, save_array, save_object};
use visa_pipeline::preprocess::{FittedPreprocessor, PreprocessorPlan};
use visa_pipeline::schema::SchemaConfig;
use visa_pipeline::storage::Table;

fn fitted() -> (Table, FittedPreprocessor, ndarray::Array2<f64>, Vec<usize>) {
    let schema = SchemaConfig::from_yaml(common::schema_path()).unwrap();
    let table = Table::from_documents(&visa_documents(120, 3)).unwrap();
    let prepared = prepare_features(&table, &schema, CURRENT_YEAR).unwrap();
    let (preprocessor, x) = PreprocessorPlan::from_schema(&schema)
        .fit_transform(&prepared.features)
        .unwrap();
    (prepared.features, preprocessor, x, prepared.labels)
}

#[test]
fn test_preprocessor_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transformed_object").join("preprocessing.json");
    let (features, preprocessor, x, _) = fitted();

    save_object(&path, &preprocessor).unwrap();
    let restored: FittedPreprocessor = load_object(&path).unwrap();

    assert_eq!(restored, preprocessor);
    assert_eq!(restored.transform(&features).unwrap(), x);
}

#[test]
fn test_bundled_model_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (features, preprocessor, x, labels) = fitted();

    let mut params = Params::new();
    params.insert("n_estimators".to_string(), ParamValue::from(5_u64));
    params.insert("max_depth".to_string(), ParamValue::from(6_u64));
    for (class, params) in [
        ("RandomForestClassifier", params),
        ("KNeighborsClassifier", Params::new()),
        ("LogisticRegression", Params::new()),
    ] {
        let classifier = ModelSpec::from_params(class, &params)
            .unwrap()
            .fit(x.view(), &labels, 42)
            .unwrap();
        let model = VisaModel::new(preprocessor.clone(), classifier);

        let path = dir.path().join(format!("{class}.json"));
        save_object(&path, &model).unwrap();
        let restored: VisaModel = load_object(&path).unwrap();

        assert_eq!(
            serde_json::to_value(&restored).unwrap(),
            serde_json::to_value(&model).unwrap(),
            "{class}"
        );
        assert_eq!(restored.predict(&features).unwrap(), model.predict(&features).unwrap());
    }
}

#[test]
fn test_array_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transformed").join("train.parquet");
    let (_, _, x, _) = fitted();

    save_array(&path, &x).unwrap();
    assert_eq!(load_array(&path).unwrap(), x);
}
