//! k-nearest-neighbours classifier backed by `smartcore`

use super::{
    check_width, from_targets, param_str, param_usize, smartcore_error, to_matrix, to_targets,
    ParamValue,
};
use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use smartcore::algorithm::neighbour::KNNAlgorithmName;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::neighbors::KNNWeightFunction;

type Knn = KNNClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>, Euclidian<f64>>;

/// Vote weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnWeights {
    /// Every neighbour votes 1
    Uniform,
    /// Neighbours vote `1 / distance`
    Distance,
}

/// Neighbour search strategy named in `model.yaml`.
///
/// The search itself is always a linear scan; the name is kept so the
/// configured grid round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnAlgorithm {
    /// Let the implementation choose
    Auto,
    /// Ball tree
    BallTree,
    /// k-d tree
    KdTree,
    /// Exhaustive scan
    Brute,
}

/// KNN hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    /// Neighbours consulted per prediction
    pub n_neighbors: usize,
    /// Vote weighting
    pub weights: KnnWeights,
    /// Named search strategy
    pub algorithm: KnnAlgorithm,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: KnnWeights::Uniform,
            algorithm: KnnAlgorithm::Auto,
        }
    }
}

impl KnnParams {
    pub(super) fn set(&mut self, key: &str, value: &ParamValue) -> Result<()> {
        match key {
            "n_neighbors" => self.n_neighbors = param_usize(key, value)?,
            "weights" => {
                self.weights = match param_str(key, value)? {
                    "uniform" => KnnWeights::Uniform,
                    "distance" => KnnWeights::Distance,
                    other => return Err(Error::Config(format!("Unknown weights '{other}'"))),
                }
            }
            "algorithm" => {
                self.algorithm = match param_str(key, value)? {
                    "auto" => KnnAlgorithm::Auto,
                    "ball_tree" => KnnAlgorithm::BallTree,
                    "kd_tree" => KnnAlgorithm::KdTree,
                    "brute" => KnnAlgorithm::Brute,
                    other => return Err(Error::Config(format!("Unknown algorithm '{other}'"))),
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "Unknown KNeighborsClassifier parameter '{other}'"
                )))
            }
        }
        Ok(())
    }

    fn parameters(&self) -> KNNClassifierParameters<f64, Euclidian<f64>> {
        let weight = match self.weights {
            KnnWeights::Uniform => KNNWeightFunction::Uniform,
            KnnWeights::Distance => KNNWeightFunction::Distance,
        };
        KNNClassifierParameters::default()
            .with_k(self.n_neighbors)
            .with_weight(weight)
            .with_algorithm(KNNAlgorithmName::LinearSearch)
    }
}

/// Fitted KNN model
#[derive(Serialize, Deserialize)]
pub struct KnnClassifier {
    params: KnnParams,
    n_features: usize,
    model: Knn,
}

impl KnnClassifier {
    /// Index the training set
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if `n_neighbors` is below 2 or exceeds the
    /// sample count
    pub fn fit(params: KnnParams, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<Self> {
        if params.n_neighbors < 2 || params.n_neighbors > y.len() {
            return Err(Error::Model(format!(
                "Expected 1 < n_neighbors <= n_samples, got n_neighbors = {} with {} samples",
                params.n_neighbors,
                y.len()
            )));
        }
        let model = Knn::fit(&to_matrix(x)?, &to_targets(y)?, params.parameters())
            .map_err(smartcore_error)?;
        Ok(Self {
            params,
            n_features: x.ncols(),
            model,
        })
    }

    /// Hyperparameters
    #[must_use]
    pub const fn params(&self) -> &KnnParams {
        &self.params
    }

    /// Majority (or distance-weighted) vote of the nearest neighbours
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

impl std::fmt::Debug for KnnClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnnClassifier")
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
    fn test_uniform_vote() {
        let x = array![[0.0], [0.1], [0.2], [5.0], [5.1]];
        let y = [0, 0, 0, 1, 1];
        let params = KnnParams {
            n_neighbors: 3,
            ..KnnParams::default()
        };
        let model = KnnClassifier::fit(params, x.view(), &y).unwrap();
        assert_eq!(model.predict(array![[0.05], [5.2]].view()).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_distance_weights_favour_close_points() {
        // Two far class-0 points outvote one close class-1 point under uniform
        let x = array![[0.0], [3.0], [3.1]];
        let y = [1, 0, 0];
        let query = array![[0.2]];

        let uniform = KnnParams {
            n_neighbors: 3,
            ..KnnParams::default()
        };
        let distance = KnnParams {
            weights: KnnWeights::Distance,
            ..uniform
        };
        let uniform = KnnClassifier::fit(uniform, x.view(), &y).unwrap();
        let distance = KnnClassifier::fit(distance, x.view(), &y).unwrap();
        assert_eq!(uniform.predict(query.view()).unwrap(), vec![0]);
        assert_eq!(distance.predict(query.view()).unwrap(), vec![1]);
    }

    #[test]
    fn test_neighbour_count_bounds() {
        let x = array![[0.0], [1.0]];
        for n_neighbors in [1, 5] {
            let params = KnnParams {
                n_neighbors,
                ..KnnParams::default()
            };
            assert!(matches!(
                KnnClassifier::fit(params, x.view(), &[0, 1]),
                Err(Error::Model(_))
            ));
        }
    }

    #[test]
    fn test_width_mismatch() {
        let x = array![[0.0], [1.0]];
        let params = KnnParams {
            n_neighbors: 2,
            ..KnnParams::default()
        };
        let model = KnnClassifier::fit(params, x.view(), &[0, 1]).unwrap();
        assert!(model.predict(array![[0.0, 0.0]].view()).is_err());
        assert!(model.predict(ndarray::Array2::zeros((0, 1)).view()).unwrap().is_empty());
    }
}
