//! Class rebalancing: SMOTE over-sampling followed by Edited Nearest Neighbours
//!
//! SMOTE synthesizes minority samples by interpolating between a minority
//! sample and one of its minority-class neighbours until the minority class
//! matches the majority count. ENN then removes every sample whose nearest
//! neighbours do not all share its class, which cleans the overlap region the
//! synthetic points tend to create.

use crate::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Minority-class neighbours used for interpolation
pub const SMOTE_K_NEIGHBORS: usize = 5;
/// Neighbours consulted by the cleaning pass
pub const ENN_N_NEIGHBORS: usize = 3;

/// SMOTE-ENN settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoteEnn {
    k_neighbors: usize,
    enn_neighbors: usize,
    seed: u64,
}

impl SmoteEnn {
    /// Default neighbour counts with the given seed
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            k_neighbors: SMOTE_K_NEIGHBORS,
            enn_neighbors: ENN_N_NEIGHBORS,
            seed,
        }
    }

    /// Override the SMOTE neighbour count
    #[must_use]
    pub const fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    /// Over-sample the minority class, then clean with ENN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if row and label counts differ, fewer
    /// than two classes are present, or the minority class has fewer than two
    /// samples
    pub fn fit_resample(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>)> {
        let (features, labels) = self.smote(features, labels)?;
        let (features, labels) =
            edited_nearest_neighbours(features.view(), &labels, self.enn_neighbors);
        Ok((features, labels))
    }

    /// SMOTE step alone
    ///
    /// # Errors
    ///
    /// See [`SmoteEnn::fit_resample`]
    pub fn smote(
        &self,
        features: ArrayView2<'_, f64>,
        labels: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>)> {
        if features.nrows() != labels.len() {
            return Err(Error::InvalidInput(format!(
                "Feature rows ({}) and labels ({}) differ",
                features.nrows(),
                labels.len()
            )));
        }

        let counts = class_counts(labels);
        if counts.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "Resampling needs at least two classes, found {}",
                counts.len()
            )));
        }

        // Ties resolve to the smallest class label
        let (&minority, &minority_count) = counts
            .iter()
            .min_by_key(|(&class, &count)| (count, class))
            .ok_or_else(|| Error::InvalidInput("No samples to resample".to_string()))?;
        let majority_count = counts.values().copied().max().unwrap_or(0);

        if minority_count < 2 {
            return Err(Error::InvalidInput(format!(
                "Minority class {minority} has {minority_count} sample(s); SMOTE needs at least 2"
            )));
        }

        let n_synthetic = majority_count - minority_count;
        let minority_rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == minority)
            .map(|(row, _)| row)
            .collect();
        let k = self.k_neighbors.min(minority_count - 1);

        let neighbours: Vec<Vec<usize>> = minority_rows
            .iter()
            .map(|&row| {
                nearest(features.row(row), features, &minority_rows, Some(row), k)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n_features = features.ncols();
        let mut data = features.iter().copied().collect::<Vec<f64>>();
        data.reserve(n_synthetic * n_features);

        for _ in 0..n_synthetic {
            let sample = rng.gen_range(0..minority_rows.len());
            let neighbour = neighbours[sample][rng.gen_range(0..neighbours[sample].len())];
            let gap: f64 = rng.gen();
            let base = features.row(minority_rows[sample]);
            let other = features.row(neighbour);
            data.extend(
                base.iter()
                    .zip(other.iter())
                    .map(|(&b, &o)| gap.mul_add(o - b, b)),
            );
        }

        let mut out_labels = labels.to_vec();
        out_labels.extend(std::iter::repeat(minority).take(n_synthetic));

        let resampled = Array2::from_shape_vec((out_labels.len(), n_features), data)
            .map_err(|e| Error::Other(format!("SMOTE produced an invalid shape: {e}")))?;
        tracing::debug!(
            minority,
            synthetic = n_synthetic,
            rows = out_labels.len(),
            "SMOTE over-sampling complete"
        );
        Ok((resampled, out_labels))
    }
}

/// Keep only samples whose `k` nearest neighbours all share their class
#[must_use]
pub fn edited_nearest_neighbours(
    features: ArrayView2<'_, f64>,
    labels: &[usize],
    k: usize,
) -> (Array2<f64>, Vec<usize>) {
    let all_rows: Vec<usize> = (0..labels.len()).collect();
    let k = k.min(labels.len().saturating_sub(1));

    let keep: Vec<usize> = all_rows
        .iter()
        .copied()
        .filter(|&row| {
            nearest(features.row(row), features, &all_rows, Some(row), k)
                .iter()
                .all(|&neighbour| labels[neighbour] == labels[row])
        })
        .collect();

    let kept = features.select(ndarray::Axis(0), &keep);
    let kept_labels = keep.iter().map(|&row| labels[row]).collect();
    tracing::debug!(
        removed = labels.len() - keep.len(),
        kept = keep.len(),
        "Edited nearest neighbours cleaning complete"
    );
    (kept, kept_labels)
}

/// Sample count per class, ordered by class label
#[must_use]
pub fn class_counts(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Squared Euclidean distance
fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Indices (from `candidates`) of the `k` rows closest to `query`, nearest
/// first, excluding `exclude`. Distance ties keep candidate order.
fn nearest(
    query: ArrayView1<'_, f64>,
    features: ArrayView2<'_, f64>,
    candidates: &[usize],
    exclude: Option<usize>,
    k: usize,
) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = candidates
        .iter()
        .filter(|&&row| Some(row) != exclude)
        .map(|&row| (squared_distance(query, features.row(row)), row))
        .collect();

    let k = k.min(scored.len());
    if k == 0 {
        return Vec::new();
    }
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);
    }
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, row)| row).collect()
}
