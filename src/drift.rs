//! Dataset drift between a reference table and a current table
//!
//! Each column shared by both tables is tested independently: numeric
//! columns with the two-sample Kolmogorov-Smirnov test, everything else with
//! a chi-square homogeneity test. A column drifts when its p-value falls
//! below the threshold, and the dataset drifts when the drifted share reaches
//! the configured fraction.

use crate::stats::{chi_square_two_sample, ks_two_sample, TestOutcome};
use crate::storage::Table;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column kind, which decides the test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Integer or float column
    Numerical,
    /// String or boolean column
    Categorical,
}

/// Statistical test applied to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftTest {
    /// Two-sample Kolmogorov-Smirnov
    KolmogorovSmirnov,
    /// Pearson chi-square
    ChiSquare,
}

/// Per-column drift result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    /// Column kind
    pub kind: FeatureKind,
    /// Test used
    pub test: DriftTest,
    /// Test statistic
    pub statistic: f64,
    /// p-value
    pub p_value: f64,
    /// Whether `p_value` is below the threshold
    pub drifted: bool,
}

/// Thresholds for drift decisions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThresholds {
    /// Per-column p-value threshold
    pub p_value: f64,
    /// Share of drifted columns that flags the dataset
    pub dataset_share: f64,
}

/// Dataset drift report, persisted as YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Columns tested
    pub n_features: usize,
    /// Columns that drifted
    pub n_drifted_features: usize,
    /// `n_drifted_features / n_features`
    pub share_of_drifted_features: f64,
    /// Dataset-level drift flag
    pub dataset_drift: bool,
    /// Per-column results, by column name
    pub features: BTreeMap<String, FeatureDrift>,
}

impl DriftReport {
    /// `(n_drifted_features, n_features)`
    #[must_use]
    pub const fn drift_counts(&self) -> (usize, usize) {
        (self.n_drifted_features, self.n_features)
    }
}

/// Compare `current` against `reference`, column by column.
///
/// Columns present in only one table are skipped.
///
/// # Errors
///
/// Returns error if a shared column cannot be read
#[allow(clippy::cast_precision_loss)]
pub fn detect_drift(
    reference: &Table,
    current: &Table,
    thresholds: DriftThresholds,
) -> Result<DriftReport> {
    let mut features = BTreeMap::new();

    for column in reference.column_names() {
        if !current.has_column(&column) {
            continue;
        }

        let numeric = reference.is_numeric(&column)? && current.is_numeric(&column)?;
        let (kind, test, TestOutcome { statistic, p_value }) = if numeric {
            (
                FeatureKind::Numerical,
                DriftTest::KolmogorovSmirnov,
                ks_two_sample(
                    &reference.numeric_column(&column)?,
                    &current.numeric_column(&column)?,
                ),
            )
        } else {
            (
                FeatureKind::Categorical,
                DriftTest::ChiSquare,
                chi_square_two_sample(
                    &reference.string_column(&column)?,
                    &current.string_column(&column)?,
                ),
            )
        };

        let drifted = p_value < thresholds.p_value;
        if drifted {
            tracing::debug!(column = %column, p_value, "Column drift detected");
        }
        features.insert(
            column,
            FeatureDrift {
                kind,
                test,
                statistic,
                p_value,
                drifted,
            },
        );
    }

    let n_features = features.len();
    let n_drifted_features = features.values().filter(|f| f.drifted).count();
    let share_of_drifted_features = if n_features == 0 {
        0.0
    } else {
        n_drifted_features as f64 / n_features as f64
    };

    Ok(DriftReport {
        n_features,
        n_drifted_features,
        share_of_drifted_features,
        dataset_drift: n_features > 0 && share_of_drifted_features >= thresholds.dataset_share,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Document;
    use serde_json::json;

    const THRESHOLDS: DriftThresholds = DriftThresholds {
        p_value: 0.05,
        dataset_share: 0.5,
    };

    fn table(offset: i64, continent: &str, rows: i64) -> Table {
        let docs: Vec<Document> = (0..rows)
            .map(|i| {
                json!({
                    "no_of_employees": offset + i,
                    "continent": if i % 4 == 0 { "Europe" } else { continent },
                })
                .as_object()
                .cloned()
                .unwrap()
            })
            .collect();
        Table::from_documents(&docs).unwrap()
    }

    #[test]
    fn test_no_drift_on_same_distribution() {
        let report =
            detect_drift(&table(0, "Asia", 80), &table(0, "Asia", 80), THRESHOLDS).unwrap();
        assert_eq!(report.drift_counts(), (0, 2));
        assert!(!report.dataset_drift);
    }

    #[test]
    fn test_drift_on_shifted_distribution() {
        let report =
            detect_drift(&table(0, "Asia", 80), &table(5000, "Africa", 80), THRESHOLDS).unwrap();

        assert_eq!(report.drift_counts(), (2, 2));
        assert!(report.dataset_drift);
        let employees = &report.features["no_of_employees"];
        assert_eq!(employees.kind, FeatureKind::Numerical);
        assert_eq!(employees.test, DriftTest::KolmogorovSmirnov);
        assert_eq!(report.features["continent"].test, DriftTest::ChiSquare);
    }

    #[test]
    fn test_half_drifted_counts_as_dataset_drift() {
        let report =
            detect_drift(&table(0, "Asia", 80), &table(5000, "Asia", 80), THRESHOLDS).unwrap();
        assert_eq!(report.drift_counts(), (1, 2));
        assert!(report.dataset_drift);
    }

    #[test]
    fn test_report_serializes_to_yaml() {
        let report =
            detect_drift(&table(0, "Asia", 20), &table(0, "Asia", 20), THRESHOLDS).unwrap();
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("n_drifted_features: 0"));
        assert!(yaml.contains("kolmogorov_smirnov"));
    }
}
