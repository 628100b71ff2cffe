//! Classifiers, model search and the bundled production model
//!
//! Estimators are described by a [`ModelSpec`] (class name plus
//! hyperparameters, as written in `model.yaml`) and fitted into a
//! [`Classifier`], which wraps the matching `smartcore` estimator.
//! [`ModelFactory`] searches the configured grids with
//! cross-validation; [`VisaModel`] pairs the winner with the fitted
//! preprocessor so raw application tables can be scored directly.
//!
//! # Example
//!
//! ```rust
//! use ndarray::array;
//! use visa_pipeline::model::{ModelSpec, ParamValue, Params};
//!
//! # fn example() -> visa_pipeline::Result<()> {
//! let mut params = Params::new();
//! params.insert("n_neighbors".to_string(), ParamValue::from(2_u64));
//! let spec = ModelSpec::from_params("KNeighborsClassifier", &params)?;
//!
//! let x = array![[0.0], [0.1], [1.0], [1.1]];
//! let model = spec.fit(x.view(), &[0, 0, 1, 1], 42)?;
//! assert_eq!(model.predict(array![[0.9]].view())?, vec![1]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod bundle;
mod forest;
mod knn;
mod logistic;
pub mod metrics;
mod search;
mod tree;

pub use bundle::VisaModel;
pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use knn::{KnnAlgorithm, KnnClassifier, KnnParams, KnnWeights};
pub use logistic::{LogisticParams, LogisticRegression};
pub use search::{BestModelDetail, GridSearchConfig, ModelFactory, ModelSelectionEntry, Scoring};
pub use tree::{Criterion, DecisionTree, TreeParams};

use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeMap;

/// A single hyperparameter value as written in YAML
pub type ParamValue = serde_yaml::Value;

/// Hyperparameters by name
pub type Params = BTreeMap<String, ParamValue>;

pub(crate) fn param_usize(key: &str, value: &ParamValue) -> Result<usize> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            Error::Config(format!(
                "Parameter '{key}' must be a non-negative integer, got {value:?}"
            ))
        })
}

pub(crate) fn param_f64(key: &str, value: &ParamValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::Config(format!("Parameter '{key}' must be a number, got {value:?}")))
}

pub(crate) fn param_str<'a>(key: &str, value: &'a ParamValue) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::Config(format!("Parameter '{key}' must be a string, got {value:?}")))
}

pub(crate) fn param_bool(key: &str, value: &ParamValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::Config(format!("Parameter '{key}' must be a boolean, got {value:?}")))
}

/// Row-major copy of `x` in the matrix type the estimators take
pub(crate) fn to_matrix(x: ArrayView2<'_, f64>) -> Result<DenseMatrix<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::Model(format!(
            "Found array with {} sample(s) and {} feature(s), at least one of each is required",
            x.nrows(),
            x.ncols()
        )));
    }
    let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|row| row.to_vec()).collect();
    Ok(DenseMatrix::from_2d_vec(&rows))
}

pub(crate) fn to_targets(y: &[usize]) -> Result<Vec<u32>> {
    y.iter()
        .map(|&label| {
            u32::try_from(label).map_err(|_| Error::Model(format!("Label {label} is out of range")))
        })
        .collect()
}

pub(crate) fn from_targets(y: Vec<u32>) -> Result<Vec<usize>> {
    y.into_iter()
        .map(|label| {
            usize::try_from(label)
                .map_err(|_| Error::Model(format!("Label {label} is out of range")))
        })
        .collect()
}

#[allow(clippy::needless_pass_by_value)]
pub(crate) fn smartcore_error(err: Failed) -> Error {
    Error::Model(err.to_string())
}

pub(crate) fn check_width(expected: usize, x: ArrayView2<'_, f64>) -> Result<()> {
    if x.ncols() == expected {
        Ok(())
    } else {
        Err(Error::Model(format!(
            "X has {} features, but the model was fitted with {expected} features",
            x.ncols()
        )))
    }
}

/// Estimator class plus hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "params")]
pub enum ModelSpec {
    /// k-nearest neighbours
    #[serde(rename = "KNeighborsClassifier")]
    KNeighbors(KnnParams),
    /// Single CART tree
    #[serde(rename = "DecisionTreeClassifier")]
    DecisionTree(TreeParams),
    /// Random forest
    #[serde(rename = "RandomForestClassifier")]
    RandomForest(ForestParams),
    /// Logistic regression
    #[serde(rename = "LogisticRegression")]
    LogisticRegression(LogisticParams),
}

impl ModelSpec {
    /// Class names accepted by [`ModelSpec::from_params`]
    pub const CLASSES: [&'static str; 4] = [
        "KNeighborsClassifier",
        "DecisionTreeClassifier",
        "RandomForestClassifier",
        "LogisticRegression",
    ];

    /// Defaults for `class`, overridden by `params`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown class, unknown parameter, or a
    /// value of the wrong type
    pub fn from_params(class: &str, params: &Params) -> Result<Self> {
        let mut spec = match class {
            "KNeighborsClassifier" => Self::KNeighbors(KnnParams::default()),
            "DecisionTreeClassifier" => Self::DecisionTree(TreeParams::default()),
            "RandomForestClassifier" => Self::RandomForest(ForestParams::default()),
            "LogisticRegression" => Self::LogisticRegression(LogisticParams::default()),
            other => {
                return Err(Error::Config(format!(
                    "Unknown model class '{other}', expected one of {:?}",
                    Self::CLASSES
                )))
            }
        };
        for (key, value) in params {
            spec.set(key, value)?;
        }
        Ok(spec)
    }

    /// Override a single hyperparameter
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown parameter or a wrongly typed value
    pub fn set(&mut self, key: &str, value: &ParamValue) -> Result<()> {
        match self {
            Self::KNeighbors(params) => params.set(key, value),
            Self::DecisionTree(params) => {
                if params.set(key, value)? {
                    Ok(())
                } else {
                    Err(Error::Config(format!(
                        "Unknown DecisionTreeClassifier parameter '{key}'"
                    )))
                }
            }
            Self::RandomForest(params) => params.set(key, value),
            Self::LogisticRegression(params) => params.set(key, value),
        }
    }

    /// Class name as written in `model.yaml`
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        match self {
            Self::KNeighbors(_) => Self::CLASSES[0],
            Self::DecisionTree(_) => Self::CLASSES[1],
            Self::RandomForest(_) => Self::CLASSES[2],
            Self::LogisticRegression(_) => Self::CLASSES[3],
        }
    }

    /// Fit on `x`/`y`; `seed` drives the forest's bootstrap
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the shapes disagree or the estimator rejects
    /// the data
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[usize], seed: u64) -> Result<Classifier> {
        if x.nrows() != y.len() {
            return Err(Error::Model(format!(
                "Found input variables with inconsistent numbers of samples: [{}, {}]",
                x.nrows(),
                y.len()
            )));
        }
        Ok(match self {
            Self::KNeighbors(params) => Classifier::KNeighbors(KnnClassifier::fit(*params, x, y)?),
            Self::DecisionTree(params) => {
                Classifier::DecisionTree(DecisionTree::fit(*params, x, y)?)
            }
            Self::RandomForest(params) => {
                Classifier::RandomForest(RandomForest::fit(*params, x, y, seed)?)
            }
            Self::LogisticRegression(params) => {
                Classifier::LogisticRegression(LogisticRegression::fit(*params, x, y)?)
            }
        })
    }
}

/// Fitted estimator
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// k-nearest neighbours
    KNeighbors(KnnClassifier),
    /// Single CART tree
    DecisionTree(DecisionTree),
    /// Random forest
    RandomForest(RandomForest),
    /// Logistic regression
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    /// Predicted labels, one per row
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the feature count differs from training
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        match self {
            Self::KNeighbors(model) => model.predict(x),
            Self::DecisionTree(model) => model.predict(x),
            Self::RandomForest(model) => model.predict(x),
            Self::LogisticRegression(model) => model.predict(x),
        }
    }
}
