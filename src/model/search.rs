//! Grid search over the estimators listed in `model.yaml`

use super::metrics::{accuracy_score, f1_score, precision_score, recall_score};
use super::{Classifier, ModelSpec, ParamValue, Params};
use crate::persist::read_yaml;
use crate::{Error, Result};
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Cross-validation score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    /// Fraction of correct labels
    #[default]
    Accuracy,
    /// F1 of label 1
    F1,
    /// Precision of label 1
    Precision,
    /// Recall of label 1
    Recall,
}

impl Scoring {
    /// Score predictions against the truth
    #[must_use]
    pub fn score(self, y_true: &[usize], y_pred: &[usize]) -> f64 {
        match self {
            Self::Accuracy => accuracy_score(y_true, y_pred),
            Self::F1 => f1_score(y_true, y_pred),
            Self::Precision => precision_score(y_true, y_pred),
            Self::Recall => recall_score(y_true, y_pred),
        }
    }
}

const fn default_cv() -> usize {
    5
}

/// `grid_search` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSearchConfig {
    /// Stratified folds
    #[serde(default = "default_cv")]
    pub cv: usize,
    /// Score maximized by the search
    #[serde(default)]
    pub scoring: Scoring,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            cv: default_cv(),
            scoring: Scoring::default(),
        }
    }
}

/// One `model_selection.module_N` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelectionEntry {
    /// Estimator class name
    pub class: String,
    /// Base hyperparameters
    #[serde(default)]
    pub params: Params,
    /// Values tried for each searched hyperparameter
    #[serde(default)]
    pub search_param_grid: BTreeMap<String, Vec<ParamValue>>,
}

impl ModelSelectionEntry {
    /// Every combination of the grid applied over the base parameters.
    ///
    /// Keys vary in name order, the last key fastest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown class or parameter
    pub fn candidates(&self) -> Result<Vec<ModelSpec>> {
        let base = ModelSpec::from_params(&self.class, &self.params)?;
        let mut candidates = vec![base];
        for (key, values) in &self.search_param_grid {
            if values.is_empty() {
                return Err(Error::Config(format!(
                    "search_param_grid entry '{key}' of {} has no values",
                    self.class
                )));
            }
            let mut expanded = Vec::with_capacity(candidates.len() * values.len());
            for candidate in &candidates {
                for value in values {
                    let mut next = candidate.clone();
                    next.set(key, value)?;
                    expanded.push(next);
                }
            }
            candidates = expanded;
        }
        Ok(candidates)
    }
}

/// Winner of a search
#[derive(Debug)]
pub struct BestModelDetail {
    /// `model_selection` key of the winning entry
    pub name: String,
    /// Winning hyperparameters
    pub spec: ModelSpec,
    /// Mean cross-validated score
    pub best_score: f64,
    /// Winner refitted on all rows
    pub best_model: Classifier,
}

/// Model search driven by `model.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFactory {
    /// Cross-validation settings
    #[serde(default)]
    pub grid_search: GridSearchConfig,
    /// Candidate estimators by name
    pub model_selection: BTreeMap<String, ModelSelectionEntry>,
}

impl ModelFactory {
    /// Load a search description
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or lists no models
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let factory: Self = read_yaml(path)?;
        factory.validate()?;
        Ok(factory)
    }

    fn validate(&self) -> Result<()> {
        if self.model_selection.is_empty() {
            return Err(Error::Config("model_selection lists no models".to_string()));
        }
        if self.grid_search.cv < 2 {
            return Err(Error::Config(format!(
                "grid_search.cv must be at least 2, got {}",
                self.grid_search.cv
            )));
        }
        Ok(())
    }

    /// Grid-search every entry, refit each entry's best candidate on all
    /// rows and return the overall winner.
    ///
    /// Ties keep the earlier entry and the earlier candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BelowExpectedScore`] if the winner scores below
    /// `base_score`, or [`Error::Model`] if no candidate could be fitted
    pub fn get_best_model(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        base_score: f64,
        seed: u64,
    ) -> Result<BestModelDetail> {
        self.validate()?;
        let folds = stratified_folds(y, self.grid_search.cv)?;

        let mut best: Option<(String, ModelSpec, f64)> = None;
        for (name, entry) in &self.model_selection {
            let mut entry_best: Option<(ModelSpec, f64)> = None;
            for candidate in entry.candidates()? {
                // A candidate that cannot be fitted is skipped, not fatal
                let score = match self.cross_validate(&candidate, x, y, &folds, seed) {
                    Ok(score) => score,
                    Err(err) => {
                        tracing::warn!(
                            model = %name,
                            ?candidate,
                            error = %err,
                            "Candidate fit failed"
                        );
                        continue;
                    }
                };
                tracing::debug!(model = %name, ?candidate, score, "Scored candidate");
                if entry_best.as_ref().map_or(true, |(_, s)| score > *s) {
                    entry_best = Some((candidate, score));
                }
            }

            if let Some((spec, score)) = entry_best {
                tracing::info!(
                    model = %name,
                    class = spec.class_name(),
                    score,
                    "Best candidate for model"
                );
                if best.as_ref().map_or(true, |(_, _, s)| score > *s) {
                    best = Some((name.clone(), spec, score));
                }
            }
        }

        let (name, spec, best_score) =
            best.ok_or_else(|| Error::Model("Every model candidate failed to fit".to_string()))?;

        if best_score < base_score {
            tracing::info!(
                best_score,
                base_score,
                "No best model found with score more than base score"
            );
            return Err(Error::BelowExpectedScore {
                best_score,
                expected: base_score,
            });
        }

        let best_model = spec.fit(x, y, seed)?;
        Ok(BestModelDetail {
            name,
            spec,
            best_score,
            best_model,
        })
    }

    fn cross_validate(
        &self,
        spec: &ModelSpec,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        folds: &[Vec<usize>],
        seed: u64,
    ) -> Result<f64> {
        let mut total = 0.0;
        for validation in folds {
            let mut in_validation = vec![false; y.len()];
            for &row in validation {
                in_validation[row] = true;
            }
            let train: Vec<usize> = (0..y.len()).filter(|&row| !in_validation[row]).collect();

            let x_train = x.select(Axis(0), &train);
            let y_train: Vec<usize> = train.iter().map(|&row| y[row]).collect();
            let x_valid = x.select(Axis(0), validation);
            let y_valid: Vec<usize> = validation.iter().map(|&row| y[row]).collect();

            let model = spec.fit(x_train.view(), &y_train, seed)?;
            total += self.grid_search.scoring.score(&y_valid, &model.predict(x_valid.view())?);
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(total / folds.len() as f64)
    }
}

/// Validation rows of each fold.
///
/// Each class's rows, in order, are cut into `k` contiguous chunks of
/// near-equal size and fold `i` takes chunk `i` of every class.
///
/// # Errors
///
/// Returns [`Error::Model`] if any fold would be empty
pub fn stratified_folds(y: &[usize], k: usize) -> Result<Vec<Vec<usize>>> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }

    let mut folds = vec![Vec::new(); k];
    for rows in by_class.values() {
        let (size, extra) = (rows.len() / k, rows.len() % k);
        let mut start = 0;
        for (fold, target) in folds.iter_mut().enumerate() {
            let len = size + usize::from(fold < extra);
            target.extend_from_slice(&rows[start..start + len]);
            start += len;
        }
    }

    if folds.iter().any(Vec::is_empty) {
        return Err(Error::Model(format!(
            "Cannot split {} samples into {k} non-empty folds",
            y.len()
        )));
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}
