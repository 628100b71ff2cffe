//! Run Tracker - collects records for one run and writes the manifest

use super::{ArtifactRecord, MetricRecord, RunRecord};
use crate::error::{Error, Stage};
use crate::persist::ensure_parent_dir;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything recorded for a run, as written to `run.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Run lifecycle
    pub run: RunRecord,
    /// Metrics in the order they were logged
    pub metrics: Vec<MetricRecord>,
    /// Files the run wrote
    pub artifacts: Vec<ArtifactRecord>,
}

impl RunManifest {
    /// Read a manifest written by [`RunTracker::write_manifest`]
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::persist::load_object(path)
    }

    /// Metrics logged by `stage`
    #[must_use]
    pub fn metrics_for_stage(&self, stage: Stage) -> Vec<&MetricRecord> {
        self.metrics.iter().filter(|m| m.stage() == stage.name()).collect()
    }

    /// Value of the last metric logged under `key`
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.iter().rev().find(|m| m.key() == key).map(MetricRecord::value)
    }
}

/// Collects metrics and artifact hashes while the pipeline runs
#[derive(Debug)]
pub struct RunTracker {
    manifest: RunManifest,
    manifest_path: PathBuf,
}

impl RunTracker {
    /// Tracker for run `run_id`, writing to `manifest_path`
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        pipeline_name: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest: RunManifest {
                run: RunRecord::new(run_id, pipeline_name),
                metrics: Vec::new(),
                artifacts: Vec::new(),
            },
            manifest_path: manifest_path.into(),
        }
    }

    /// Recorded state so far
    #[must_use]
    pub const fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    /// Manifest location
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Mark the run as running
    pub fn start(&mut self) {
        self.manifest.run.start();
        tracing::info!(run_id = %self.manifest.run.run_id(), "Run started");
    }

    /// Record a metric for `stage`
    pub fn log_metric(&mut self, stage: Stage, key: &str, value: f64) {
        tracing::debug!(%stage, key, value, "Logged metric");
        let metric = MetricRecord::new(self.manifest.run.run_id(), stage, key, value);
        self.manifest.metrics.push(metric);
    }

    /// Hash a file written by `stage` and record it
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn log_artifact(&mut self, stage: Stage, key: &str, path: &Path) -> Result<()> {
        let artifact = ArtifactRecord::from_file(self.manifest.run.run_id(), stage, key, path)?;
        tracing::debug!(%stage, key, hash = artifact.cas_hash(), "Logged artifact");
        self.manifest.artifacts.push(artifact);
        Ok(())
    }

    /// Mark the run successful
    pub fn complete(&mut self) {
        self.manifest.run.complete();
    }

    /// Mark the run failed with `error`
    pub fn fail(&mut self, error: &Error) {
        let stage = error.stage().map(Stage::name);
        self.manifest.run.fail(stage, error.to_string());
    }

    /// Write the manifest as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write_manifest(&self) -> Result<()> {
        ensure_parent_dir(&self.manifest_path)?;
        let json = serde_json::to_vec_pretty(&self.manifest)?;
        std::fs::write(&self.manifest_path, json)?;
        tracing::info!(
            path = %self.manifest_path.display(),
            status = ?self.manifest.run.status(),
            "Wrote run manifest"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::RunStatus;

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        std::fs::write(&model, b"{}").unwrap();

        let mut tracker = RunTracker::new("run-1", "usvisa", dir.path().join("run.json"));
        tracker.start();
        tracker.log_metric(Stage::ModelTrainer, "f1_score", 0.8);
        tracker.log_metric(Stage::ModelEvaluation, "changed_accuracy", 0.8);
        tracker.log_artifact(Stage::ModelTrainer, "trained_model", &model).unwrap();
        tracker.complete();
        tracker.write_manifest().unwrap();

        let manifest = RunManifest::load(tracker.manifest_path()).unwrap();
        assert_eq!(&manifest, tracker.manifest());
        assert_eq!(manifest.run.status(), RunStatus::Success);
        assert_eq!(manifest.metrics_for_stage(Stage::ModelTrainer).len(), 1);
        assert_eq!(manifest.metric("changed_accuracy"), Some(0.8));
        assert_eq!(manifest.artifacts[0].key(), "trained_model");
    }

    #[test]
    fn test_failure_records_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = RunTracker::new("run-1", "usvisa", dir.path().join("run.json"));
        tracker.start();

        let err = crate::error::StageContext::stage(
            Err::<(), _>(Error::Model("boom".to_string())),
            Stage::ModelTrainer,
        )
        .unwrap_err();
        tracker.fail(&err);

        assert_eq!(tracker.manifest().run.status(), RunStatus::Failed);
        assert_eq!(tracker.manifest().run.failed_stage(), Some("model_trainer"));
        assert!(tracker.manifest().run.error().unwrap().contains("boom"));
    }
}
