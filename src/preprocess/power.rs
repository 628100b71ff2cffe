//! Yeo-Johnson power transform with standardization

use super::scaler::{mean_and_scale, standardize};
use crate::storage::Table;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Search interval for lambda
const LAMBDA_BOUNDS: (f64, f64) = (-10.0, 10.0);
/// Golden-section tolerance on lambda
const LAMBDA_TOLERANCE: f64 = 1e-9;
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Yeo-Johnson transform of a single value
#[must_use]
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < f64::EPSILON {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Negative Yeo-Johnson log-likelihood; infinite for degenerate variance
#[allow(clippy::cast_precision_loss)]
fn negative_log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    let mean = transformed.iter().sum::<f64>() / n;
    let variance = transformed.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    if !variance.is_finite() || variance <= f64::MIN_POSITIVE {
        return f64::INFINITY;
    }

    let jacobian: f64 = values.iter().map(|&x| x.signum() * x.abs().ln_1p()).sum();
    (n / 2.0).mul_add(variance.ln(), -(lambda - 1.0) * jacobian)
}

/// Maximum-likelihood lambda by golden-section search.
///
/// Constant columns have no defined optimum and get lambda = 1 (identity).
#[must_use]
pub fn fit_lambda(values: &[f64]) -> f64 {
    if is_constant(values) {
        return 1.0;
    }

    let (mut low, mut high) = LAMBDA_BOUNDS;
    let mut left = high - INV_PHI * (high - low);
    let mut right = low + INV_PHI * (high - low);
    let mut f_left = negative_log_likelihood(values, left);
    let mut f_right = negative_log_likelihood(values, right);

    if f_left.is_infinite() && f_right.is_infinite() {
        return 1.0;
    }

    while high - low > LAMBDA_TOLERANCE {
        if f_left < f_right {
            high = right;
            right = left;
            f_right = f_left;
            left = high - INV_PHI * (high - low);
            f_left = negative_log_likelihood(values, left);
        } else {
            low = left;
            left = right;
            f_left = f_right;
            right = low + INV_PHI * (high - low);
            f_right = negative_log_likelihood(values, right);
        }
    }

    (low + high) / 2.0
}

/// True when every value equals the first, up to rounding
fn is_constant(values: &[f64]) -> bool {
    let Some(&first) = values.first() else {
        return true;
    };
    let tolerance = f64::EPSILON * first.abs().max(1.0) * 4.0;
    values.iter().all(|&x| (x - first).abs() <= tolerance)
}

/// Per-column Yeo-Johnson lambdas followed by zero-mean, unit-variance scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformer {
    columns: Vec<String>,
    lambdas: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl PowerTransformer {
    /// Fit lambdas and standardization parameters
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing or non-numeric
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let mut lambdas = Vec::with_capacity(columns.len());
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());

        for column in columns {
            let values = table.numeric_column(column)?;
            let lambda = if values.is_empty() { 1.0 } else { fit_lambda(&values) };
            let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
            let (mean, scale) = mean_and_scale(&transformed);
            tracing::debug!(column = %column, lambda, "Fitted Yeo-Johnson lambda");
            lambdas.push(lambda);
            means.push(mean);
            scales.push(scale);
        }

        Ok(Self {
            columns: columns.to_vec(),
            lambdas,
            means,
            scales,
        })
    }

    /// Fitted lambdas, one per column
    #[must_use]
    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    /// Output column names (the input names)
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    /// Transform into output columns
    ///
    /// # Errors
    ///
    /// Returns error if a column is missing or non-numeric
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let values = table.numeric_column(column)?;
                let transformed: Vec<f64> = values
                    .iter()
                    .map(|&x| yeo_johnson(x, self.lambdas[index]))
                    .collect();
                Ok(standardize(&transformed, self.means[index], self.scales[index]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yeo_johnson_identity_at_one() {
        for x in [-3.5, -1.0, 0.0, 0.5, 42.0] {
            assert!((yeo_johnson(x, 1.0) - x).abs() < 1e-12);
        }
    }

    #[test]
    fn test_yeo_johnson_log_branches() {
        assert!((yeo_johnson(std::f64::consts::E - 1.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((yeo_johnson(1.0 - std::f64::consts::E, 2.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_yeo_johnson_monotonic() {
        for lambda in [-2.0, -0.5, 0.0, 0.7, 2.0, 3.0] {
            let mut previous = f64::NEG_INFINITY;
            for x in [-10.0, -1.0, -0.1, 0.0, 0.1, 1.0, 10.0] {
                let y = yeo_johnson(x, lambda);
                assert!(y > previous, "not increasing at x={x}, lambda={lambda}");
                previous = y;
            }
        }
    }

    #[test]
    fn test_fit_lambda_compresses_right_skew() {
        // Exponential growth: the optimum pulls lambda well below 1
        let values: Vec<f64> = (0..200).map(|i| (f64::from(i) / 20.0).exp()).collect();
        let lambda = fit_lambda(&values);
        assert!(lambda < 0.5, "lambda = {lambda}");
    }

    #[test]
    fn test_fit_lambda_constant_column() {
        for value in [3.0, -7.5, 0.0, 1.0e6] {
            let lambda = fit_lambda(&[value; 4]);
            assert!((lambda - 1.0).abs() < f64::EPSILON, "{value}: lambda = {lambda}");
        }
        assert!((fit_lambda(&[]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_lambda_is_local_optimum() {
        let values: Vec<f64> = (1..100).map(|i| f64::from(i).powi(2)).collect();
        let lambda = fit_lambda(&values);
        let best = negative_log_likelihood(&values, lambda);
        assert!(best <= negative_log_likelihood(&values, lambda + 0.05));
        assert!(best <= negative_log_likelihood(&values, lambda - 0.05));
    }
}
