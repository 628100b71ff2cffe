//! Shared fixtures: synthetic visa records and pipeline configs

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::path::{Path, PathBuf};
use visa_pipeline::config::{ColumnCountRule, PipelineConfig};
use visa_pipeline::constants::{COLLECTION_NAME, DATABASE_NAME};
use visa_pipeline::source::MemoryDocumentStore;
use visa_pipeline::storage::Document;

pub const CURRENT_YEAR: i32 = 2026;

pub const CONTINENTS: [&str; 3] = ["Asia", "Europe", "North America"];
pub const EDUCATION: [&str; 4] = ["High School", "Bachelor's", "Master's", "Doctorate"];
pub const REGIONS: [&str; 3] = ["West", "Northeast", "South"];

/// Small search space that finishes quickly
pub const MODEL_YAML: &str = "
grid_search:
  cv: 2
  scoring: accuracy
model_selection:
  module_0:
    class: KNeighborsClassifier
    params:
      n_neighbors: 5
    search_param_grid:
      weights: [uniform, distance]
  module_1:
    class: DecisionTreeClassifier
    params:
      max_depth: 4
";

/// Deterministic visa records.
///
/// Categories cycle with the row index so every one shows up in any split of
/// a few dozen rows. Denials follow low education, no experience and low
/// wages, with about 5% of labels flipped.
pub fn visa_documents(n: usize, seed: u64) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let education = EDUCATION[i % EDUCATION.len()];
            let experienced = rng.gen_bool(0.6);
            let wage = (if rng.gen_bool(0.5) { 95_000.0 } else { 35_000.0 }) + i as f64 * 3.7;

            let mut risk = 0;
            if matches!(education, "High School" | "Bachelor's") {
                risk += 1;
            }
            if !experienced {
                risk += 1;
            }
            if wage < 60_000.0 {
                risk += 1;
            }
            let mut denied = risk >= 2;
            if rng.gen_bool(0.05) {
                denied = !denied;
            }

            json!({
                "case_id": format!("EZYV{i:05}"),
                "continent": CONTINENTS[i % CONTINENTS.len()],
                "education_of_employee": education,
                "has_job_experience": if experienced { "Y" } else { "N" },
                "requires_job_training": if i % 5 == 0 { "Y" } else { "N" },
                "no_of_employees": 50 + (i * 37) % 5000,
                "yr_of_estab": 1900 + (i * 13) % 120,
                "region_of_employment": REGIONS[(i / 2) % REGIONS.len()],
                "prevailing_wage": wage,
                "unit_of_wage": if i % 4 == 0 { "Hour" } else { "Year" },
                "full_time_position": if i % 6 == 0 { "N" } else { "Y" },
                "case_status": if denied { "Denied" } else { "Certified" },
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect()
}

pub fn document_store(documents: Vec<Document>) -> MemoryDocumentStore {
    let mut store = MemoryDocumentStore::new();
    store.insert_collection(DATABASE_NAME, COLLECTION_NAME, documents);
    store
}

pub fn schema_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join("schema.yaml")
}

/// Config rooted at `root` with the test search space
pub fn pipeline_config(root: &Path, rule: ColumnCountRule, expected_score: f64) -> PipelineConfig {
    let model_yaml = root.join("model.yaml");
    std::fs::write(&model_yaml, MODEL_YAML).unwrap();
    PipelineConfig::builder()
        .artifact_root(root.join("artifact"))
        .timestamp("06_01_2026_10_00_00")
        .schema_file_path(schema_path())
        .model_config_file_path(model_yaml)
        .current_year(CURRENT_YEAR)
        .expected_score(expected_score)
        .column_count_rule(rule)
        .build()
}
