//! Random forest of bootstrapped CART trees, backed by `smartcore`

use super::tree::TreeParams;
use super::{
    check_width, from_targets, param_str, param_usize, smartcore_error, to_matrix, to_targets,
    ParamValue,
};
use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// `√n` rounded down, at least 1
    Sqrt,
    /// `log2(n)` rounded down, at least 1
    Log2,
    /// A fixed count, capped at the feature count
    Count(usize),
}

impl MaxFeatures {
    /// Concrete count for `n_features` columns
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let count = match self {
            Self::All => n_features,
            Self::Sqrt => n.sqrt() as usize,
            Self::Log2 => n.log2() as usize,
            Self::Count(count) => count,
        };
        count.clamp(1, n_features.max(1))
    }

    fn parse(key: &str, value: &ParamValue) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::All);
        }
        if value.is_u64() {
            return Ok(Self::Count(param_usize(key, value)?));
        }
        match param_str(key, value)? {
            "sqrt" | "auto" => Ok(Self::Sqrt),
            "log2" => Ok(Self::Log2),
            other => Err(Error::Config(format!("Unknown max_features '{other}'"))),
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Features sampled per split
    pub max_features: MaxFeatures,
    /// Per-tree settings
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_features: MaxFeatures::Sqrt,
            tree: TreeParams::default(),
        }
    }
}

impl ForestParams {
    pub(super) fn set(&mut self, key: &str, value: &ParamValue) -> Result<()> {
        match key {
            "n_estimators" => self.n_estimators = param_usize(key, value)?,
            "max_features" => self.max_features = MaxFeatures::parse(key, value)?,
            _ => {
                if !self.tree.set(key, value)? {
                    return Err(Error::Config(format!(
                        "Unknown RandomForestClassifier parameter '{key}'"
                    )));
                }
            }
        }
        Ok(())
    }

    fn parameters(&self, n_features: usize, seed: u64) -> Result<RandomForestClassifierParameters> {
        let n_trees = u16::try_from(self.n_estimators)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                Error::Model(format!(
                    "n_estimators must be in 1..=65535, got {}",
                    self.n_estimators
                ))
            })?;
        let mut parameters = RandomForestClassifierParameters::default()
            .with_criterion(self.tree.criterion.split_criterion())
            .with_min_samples_split(self.tree.min_samples_split)
            .with_min_samples_leaf(self.tree.min_samples_leaf)
            .with_n_trees(n_trees)
            .with_m(self.max_features.resolve(n_features))
            .with_seed(seed);
        if let Some(depth) = self.tree.max_depth_u16()? {
            parameters = parameters.with_max_depth(depth);
        }
        Ok(parameters)
    }
}

/// Fitted random forest
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    model: Forest,
}

impl RandomForest {
    /// Grow `n_estimators` trees on bootstrap samples drawn from `seed`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if `n_estimators` is 0 or there are no samples
    pub fn fit(
        params: ForestParams,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        seed: u64,
    ) -> Result<Self> {
        let parameters = params.parameters(x.ncols(), seed)?;
        let model = Forest::fit(&to_matrix(x)?, &to_targets(y)?, parameters)
            .map_err(smartcore_error)?;
        Ok(Self {
            params,
            n_features: x.ncols(),
            model,
        })
    }

    /// Hyperparameters the forest was grown with
    #[must_use]
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Majority vote of the trees
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the feature count differs from training
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        check_width(self.n_features, x)?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        from_targets(self.model.predict(&to_matrix(x)?).map_err(smartcore_error)?)
    }
}

impl std::fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomForest")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn data() -> (Array2<f64>, Vec<usize>) {
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let label = usize::from(i >= 20);
            values.extend([f64::from(i), f64::from(i % 3), 5.0 * label as f64]);
            labels.push(label);
        }
        (Array2::from_shape_vec((40, 3), values).unwrap(), labels)
    }

    #[test]
    fn test_forest_learns_separable_data() {
        let (x, y) = data();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(params, x.view(), &y, 42).unwrap();
        assert_eq!(forest.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = data();
        let params = ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(params, x.view(), &y, 7).unwrap();
        let b = RandomForest::fit(params, x.view(), &y, 7).unwrap();
        let shifted = x.mapv(|v| v + 0.5);
        assert_eq!(a.predict(shifted.view()).unwrap(), b.predict(shifted.view()).unwrap());
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, y) = data();
        let params = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(matches!(
            RandomForest::fit(params, x.view(), &y, 1),
            Err(Error::Model(_))
        ));
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 3);
        assert_eq!(MaxFeatures::Log2.resolve(10), 3);
        assert_eq!(MaxFeatures::Count(50).resolve(4), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(6), 6);
    }
}
