//! Run tracking
//!
//! Every training run leaves a `run.json` manifest next to its artifacts:
//!
//! ```text
//! RunRecord (1) ──< MetricRecord (N) [ordered by stage]
//!              └──< ArtifactRecord (N) [sha256 content hash]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use visa_pipeline::tracking::{RunStatus, RunTracker};
//! use visa_pipeline::Stage;
//!
//! let mut tracker = RunTracker::new("06_01_2026_10_00_00", "usvisa", "/tmp/run.json");
//! tracker.start();
//! tracker.log_metric(Stage::ModelTrainer, "f1_score", 0.81);
//! tracker.complete();
//! assert_eq!(tracker.manifest().run.status(), RunStatus::Success);
//! ```

mod artifact_record;
mod metric_record;
mod run_record;
mod tracker;

pub use artifact_record::{content_hash, ArtifactRecord};
pub use metric_record::MetricRecord;
pub use run_record::{RunRecord, RunStatus};
pub use tracker::{RunManifest, RunTracker};
