//! CART decision tree backed by `smartcore`

use super::{
    check_width, from_targets, param_str, param_usize, smartcore_error, to_matrix, to_targets,
    ParamValue,
};
use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};

type Tree = DecisionTreeClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    pub(super) fn parse(key: &str, value: &ParamValue) -> Result<Self> {
        match param_str(key, value)? {
            "gini" => Ok(Self::Gini),
            "entropy" | "log_loss" => Ok(Self::Entropy),
            other => Err(Error::Config(format!("Unknown criterion '{other}'"))),
        }
    }

    pub(super) const fn split_criterion(self) -> SplitCriterion {
        match self {
            Self::Gini => SplitCriterion::Gini,
            Self::Entropy => SplitCriterion::Entropy,
        }
    }
}

/// Tree hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Depth limit; `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Smallest node that may be split
    pub min_samples_split: usize,
    /// Smallest allowed leaf
    pub min_samples_leaf: usize,
    /// Split quality measure
    pub criterion: Criterion,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
        }
    }
}

impl TreeParams {
    /// Apply a tree-level parameter; `false` if `key` is not one
    pub(super) fn set(&mut self, key: &str, value: &ParamValue) -> Result<bool> {
        match key {
            "max_depth" => {
                self.max_depth = if value.is_null() {
                    None
                } else {
                    Some(param_usize(key, value)?)
                };
            }
            "min_samples_split" => self.min_samples_split = param_usize(key, value)?.max(2),
            "min_samples_leaf" => self.min_samples_leaf = param_usize(key, value)?.max(1),
            "criterion" => self.criterion = Criterion::parse(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Depth limit in the width `smartcore` stores it
    pub(super) fn max_depth_u16(&self) -> Result<Option<u16>> {
        self.max_depth
            .map(|depth| {
                u16::try_from(depth)
                    .map_err(|_| Error::Config(format!("max_depth {depth} is too large")))
            })
            .transpose()
    }

    fn parameters(&self) -> Result<DecisionTreeClassifierParameters> {
        let mut parameters = DecisionTreeClassifierParameters::default()
            .with_criterion(self.criterion.split_criterion())
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf);
        if let Some(depth) = self.max_depth_u16()? {
            parameters = parameters.with_max_depth(depth);
        }
        Ok(parameters)
    }
}

/// Fitted decision tree
#[derive(Serialize, Deserialize)]
pub struct DecisionTree {
    params: TreeParams,
    n_features: usize,
    model: Tree,
}

impl DecisionTree {
    /// Grow a tree on `x`/`y`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if there are no samples or the tree cannot
    /// be grown
    pub fn fit(params: TreeParams, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<Self> {
        let model = Tree::fit(&to_matrix(x)?, &to_targets(y)?, params.parameters()?)
            .map_err(smartcore_error)?;
        Ok(Self {
            params,
            n_features: x.ncols(),
            model,
        })
    }

    /// Hyperparameters the tree was grown with
    #[must_use]
    pub const fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Predicted labels
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

impl std::fmt::Debug for DecisionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionTree")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [10.0, 1.0], [11.0, 0.0], [12.0, 1.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let tree = DecisionTree::fit(TreeParams::default(), x.view(), &y).unwrap();

        assert_eq!(tree.predict(x.view()).unwrap(), y.to_vec());
        assert_eq!(tree.predict(array![[2.5, 0.0], [10.5, 0.0]].view()).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_depth_limit_is_honoured() {
        // XOR needs two levels
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = [0, 1, 1, 0];
        let stump = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let tree = DecisionTree::fit(stump, x.view(), &y).unwrap();
        assert_ne!(tree.predict(x.view()).unwrap(), y.to_vec());
    }

    #[test]
    fn test_width_mismatch() {
        let x = array![[0.0], [1.0]];
        let tree = DecisionTree::fit(TreeParams::default(), x.view(), &[0, 1]).unwrap();
        assert!(matches!(
            tree.predict(array![[0.0, 1.0]].view()),
            Err(Error::Model(_))
        ));
    }

    #[test]
    fn test_no_samples() {
        let x = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(DecisionTree::fit(TreeParams::default(), x.view(), &[]).is_err());
    }

    #[test]
    fn test_criterion_names() {
        let mut params = TreeParams::default();
        assert!(params.set("criterion", &ParamValue::from("entropy")).unwrap());
        assert_eq!(params.criterion, Criterion::Entropy);
        assert!(params.set("criterion", &ParamValue::from("hinge")).is_err());
        assert!(!params.set("n_estimators", &ParamValue::from(3_u64)).unwrap());
    }
}
