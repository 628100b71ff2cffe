//! Property-based tests for visa-pipeline
//!
//! - Split invariants: partition sizes, determinism, disjointness
//! - Resampling invariants: class balance and feature width
//! - Run with `ProptestConfig::with_cases(50)`

use ndarray::Array2;
use proptest::prelude::*;
use serde_json::json;
use visa_pipeline::components::{test_row_count, train_test_split};
use visa_pipeline::resample::{class_counts, SmoteEnn};
use visa_pipeline::storage::{Document, Table};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn numbered_table(rows: usize) -> Table {
    let docs: Vec<Document> = (0..rows)
        .map(|i| json!({"row": i}).as_object().cloned().unwrap())
        .collect();
    Table::from_documents(&docs).unwrap()
}

/// Row count and a ratio that leaves both partitions non-empty
fn arb_split() -> impl Strategy<Value = (usize, f64)> {
    (2usize..400, 0.01f64..0.99).prop_filter("both partitions non-empty", |(rows, ratio)| {
        let test = test_row_count(*rows, *ratio);
        test > 0 && test < *rows
    })
}

/// Two-class samples with a minority of at least two rows
fn arb_labelled(rows: usize) -> impl Strategy<Value = (Array2<f64>, Vec<usize>)> {
    (
        proptest::collection::vec(-100.0f64..100.0, rows * 3),
        proptest::collection::vec(0usize..2, rows),
    )
        .prop_filter("both classes with two samples", |(_, labels)| {
            let counts = class_counts(labels);
            counts.len() == 2 && counts.values().all(|&count| count >= 2)
        })
        .prop_map(move |(values, labels)| {
            (Array2::from_shape_vec((rows, 3), values).unwrap(), labels)
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: train + test = N and test is within one row of ratio * N
    #[test]
    fn prop_split_partitions_all_rows((rows, ratio) in arb_split(), seed in any::<u64>()) {
        let (train, test) = train_test_split(&numbered_table(rows), ratio, seed).unwrap();

        prop_assert_eq!(train.num_rows() + test.num_rows(), rows);
        #[allow(clippy::cast_precision_loss)]
        let target = ratio * rows as f64;
        #[allow(clippy::cast_precision_loss)]
        let actual = test.num_rows() as f64;
        prop_assert!((actual - target).abs() < 1.0);
    }

    /// Property: every row lands in exactly one partition
    #[test]
    fn prop_split_is_disjoint((rows, ratio) in arb_split(), seed in any::<u64>()) {
        let (train, test) = train_test_split(&numbered_table(rows), ratio, seed).unwrap();

        let mut seen: Vec<f64> = train.numeric_column("row").unwrap();
        seen.extend(test.numeric_column("row").unwrap());
        seen.sort_by(f64::total_cmp);
        #[allow(clippy::cast_precision_loss)]
        let expected: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        prop_assert_eq!(seen, expected);
    }

    /// Property: the same seed gives the same split
    #[test]
    fn prop_split_is_deterministic((rows, ratio) in arb_split(), seed in any::<u64>()) {
        let table = numbered_table(rows);
        let first = train_test_split(&table, ratio, seed).unwrap();
        let second = train_test_split(&table, ratio, seed).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: SMOTE alone balances the classes exactly
    #[test]
    fn prop_smote_balances_classes((x, y) in arb_labelled(40), seed in any::<u64>()) {
        let (resampled, labels) = SmoteEnn::new(seed).smote(x.view(), &y).unwrap();

        let counts = class_counts(&labels);
        prop_assert_eq!(counts[&0], counts[&1]);
        prop_assert_eq!(resampled.nrows(), labels.len());
        prop_assert_eq!(resampled.ncols(), 3);
        // Originals are kept in place
        prop_assert_eq!(&labels[..y.len()], &y[..]);
    }

    /// Property: cleaning never adds rows and keeps the feature width
    #[test]
    fn prop_smote_enn_shrinks_after_smote((x, y) in arb_labelled(40), seed in any::<u64>()) {
        let sampler = SmoteEnn::new(seed);
        let (smoted, _) = sampler.smote(x.view(), &y).unwrap();
        let (cleaned, labels) = sampler.fit_resample(x.view(), &y).unwrap();

        prop_assert!(labels.len() <= smoted.nrows());
        prop_assert_eq!(cleaned.nrows(), labels.len());
        prop_assert_eq!(cleaned.ncols(), 3);
    }
}
