//! L2-regularized logistic regression backed by `smartcore` (L-BFGS)

use super::{
    check_width, from_targets, param_f64, param_str, smartcore_error, to_matrix, to_targets,
    ParamValue,
};
use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{
    LogisticRegression as Logit, LogisticRegressionParameters,
};

type Model = Logit<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Logistic regression hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self { c: 1.0 }
    }
}

impl LogisticParams {
    pub(super) fn set(&mut self, key: &str, value: &ParamValue) -> Result<()> {
        match key {
            "C" | "c" => self.c = param_f64(key, value)?,
            "penalty" => {
                let penalty = param_str(key, value)?;
                if penalty != "l2" {
                    return Err(Error::Config(format!("Unsupported penalty '{penalty}'")));
                }
            }
            "solver" => {
                let solver = param_str(key, value)?;
                if solver != "lbfgs" {
                    return Err(Error::Config(format!("Unsupported solver '{solver}'")));
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "Unknown LogisticRegression parameter '{other}'"
                )))
            }
        }
        Ok(())
    }

    /// Penalty weight `1 / C`
    fn alpha(&self) -> Result<f64> {
        if self.c > 0.0 && self.c.is_finite() {
            Ok(1.0 / self.c)
        } else {
            Err(Error::Model(format!("C must be positive, got {}", self.c)))
        }
    }
}

/// Fitted logistic regression
#[derive(Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LogisticParams,
    n_features: usize,
    model: Model,
}

impl LogisticRegression {
    /// Minimize log-loss plus `‖w‖² / (2·C)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] for labels other than 0/1, `C <= 0`, no
    /// samples, or a single class
    pub fn fit(params: LogisticParams, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<Self> {
        if let Some(label) = y.iter().find(|&&label| label > 1) {
            return Err(Error::Model(format!(
                "LogisticRegression supports binary labels only, found {label}"
            )));
        }
        let parameters = LogisticRegressionParameters::default().with_alpha(params.alpha()?);
        let model =
            Model::fit(&to_matrix(x)?, &to_targets(y)?, parameters).map_err(smartcore_error)?;
        Ok(Self {
            params,
            n_features: x.ncols(),
            model,
        })
    }

    /// Hyperparameters
    #[must_use]
    pub const fn params(&self) -> &LogisticParams {
        &self.params
    }

    /// Label 1 when its probability exceeds one half
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

impl std::fmt::Debug for LogisticRegression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogisticRegression")
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
    fn test_separates_line() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let model = LogisticRegression::fit(LogisticParams::default(), x.view(), &y).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y.to_vec());
    }

    #[test]
    fn test_strong_regularization_keeps_orientation() {
        let x = array![[-2.0], [-1.0], [1.0], [2.0]];
        let y = [0, 0, 1, 1];
        for c in [100.0, 1.0, 0.05, 0.01] {
            let model = LogisticRegression::fit(LogisticParams { c }, x.view(), &y).unwrap();
            assert_eq!(model.predict(x.view()).unwrap(), y.to_vec(), "C = {c}");
        }
    }

    #[test]
    fn test_rejects_multiclass() {
        let x = array![[0.0], [1.0], [2.0]];
        assert!(LogisticRegression::fit(LogisticParams::default(), x.view(), &[0, 1, 2]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_c() {
        let x = array![[0.0], [1.0]];
        for c in [0.0, -1.0] {
            assert!(matches!(
                LogisticRegression::fit(LogisticParams { c }, x.view(), &[0, 1]),
                Err(Error::Model(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_penalty() {
        let mut params = LogisticParams::default();
        assert!(params.set("penalty", &ParamValue::from("l1")).is_err());
        params.set("C", &ParamValue::from(0.5)).unwrap();
        assert!((params.c - 0.5).abs() < f64::EPSILON);
    }
}
