//! Metric Record - scores reported by stages

use crate::error::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single metric reported during a run.
///
/// `step` is the ordinal of the reporting stage, so sorting by step replays
/// the run in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    run_id: String,
    stage: String,
    step: u64,
    key: String,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create a metric record stamped with the current time.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        stage: Stage,
        key: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            stage: stage.name().to_string(),
            step: stage.ordinal(),
            key: key.into(),
            value,
            timestamp: Utc::now(),
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the reporting stage name.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Get the stage ordinal.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the metric key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the time the metric was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_record_new() {
        let metric = MetricRecord::new("run-1", Stage::ModelTrainer, "f1_score", 0.8);
        assert_eq!(metric.stage(), "model_trainer");
        assert_eq!(metric.step(), 3);
        assert_eq!(metric.key(), "f1_score");
        assert!((metric.value() - 0.8).abs() < f64::EPSILON);
    }
}
