//! Run Record - one execution of the training pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Stages are executing.
    Running,
    /// Every stage that was due finished.
    Success,
    /// A stage failed and the run was aborted.
    Failed,
}

/// Lifecycle of one pipeline run.
///
/// `started_at` is set by [`RunRecord::start`], `ended_at` by
/// [`RunRecord::complete`] or [`RunRecord::fail`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    pipeline_name: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    failed_stage: Option<String>,
    error: Option<String>,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    #[must_use]
    pub fn new(run_id: impl Into<String>, pipeline_name: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            pipeline_name: pipeline_name.into(),
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            failed_stage: None,
            error: None,
        }
    }

    /// Get the run ID (the run timestamp).
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Stage that aborted the run, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&str> {
        self.failed_stage.as_deref()
    }

    /// Error message of a failed run.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start the run, transitioning from Pending to Running.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Finish the run successfully.
    pub fn complete(&mut self) {
        self.status = RunStatus::Success;
        self.ended_at = Some(Utc::now());
    }

    /// Finish the run as failed.
    pub fn fail(&mut self, stage: Option<&str>, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.ended_at = Some(Utc::now());
        self.failed_stage = stage.map(str::to_string);
        self.error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_default() {
        let run = RunRecord::new("06_01_2026_10_00_00", "usvisa");
        assert_eq!(run.status(), RunStatus::Pending);
        assert!(run.started_at().is_none());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = RunRecord::new("run-1", "usvisa");
        run.start();
        assert_eq!(run.status(), RunStatus::Running);
        run.complete();
        assert_eq!(run.status(), RunStatus::Success);
        assert!(run.ended_at() >= run.started_at());
    }

    #[test]
    fn test_failed_run_keeps_cause() {
        let mut run = RunRecord::new("run-1", "usvisa");
        run.start();
        run.fail(Some("model_trainer"), "no model above 0.6");
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.failed_stage(), Some("model_trainer"));
        assert_eq!(run.error(), Some("no model above 0.6"));
    }
}
