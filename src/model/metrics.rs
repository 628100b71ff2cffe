//! Binary classification metrics
//!
//! The positive class is label 1 (`Denied`). Ratios with a zero denominator
//! are reported as 0.

/// Label treated as positive by precision, recall and F1
pub const POSITIVE_LABEL: usize = 1;

#[derive(Debug, Default, Clone, Copy)]
struct Confusion {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

fn confusion(y_true: &[usize], y_pred: &[usize]) -> Confusion {
    let mut counts = Confusion::default();
    for (&truth, &predicted) in y_true.iter().zip(y_pred) {
        match (truth == POSITIVE_LABEL, predicted == POSITIVE_LABEL) {
            (true, true) => counts.true_positive += 1,
            (false, true) => counts.false_positive += 1,
            (true, false) => counts.false_negative += 1,
            (false, false) => {}
        }
    }
    counts
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Fraction of matching labels
#[must_use]
pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    ratio(correct, y_true.len().min(y_pred.len()))
}

/// `tp / (tp + fp)`
#[must_use]
pub fn precision_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let c = confusion(y_true, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_positive)
}

/// `tp / (tp + fn)`
#[must_use]
pub fn recall_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let c = confusion(y_true, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_negative)
}

/// Harmonic mean of precision and recall, `2tp / (2tp + fp + fn)`
#[must_use]
pub fn f1_score(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let c = confusion(y_true, y_pred);
    ratio(
        2 * c.true_positive,
        2 * c.true_positive + c.false_positive + c.false_negative,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores() {
        let y_true = [1, 1, 1, 0, 0, 0, 1, 0];
        let y_pred = [1, 0, 1, 0, 1, 0, 1, 0];

        assert!((accuracy_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((precision_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((recall_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((f1_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let y_true = [0, 0, 0];
        let y_pred = [0, 0, 0];
        assert!(precision_score(&y_true, &y_pred).abs() < f64::EPSILON);
        assert!(recall_score(&y_true, &y_pred).abs() < f64::EPSILON);
        assert!(f1_score(&y_true, &y_pred).abs() < f64::EPSILON);
        assert!((accuracy_score(&y_true, &y_pred) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_f1_is_harmonic_mean() {
        let y_true = [1, 1, 1, 1, 0];
        let y_pred = [1, 0, 0, 0, 1];
        let (p, r) = (precision_score(&y_true, &y_pred), recall_score(&y_true, &y_pred));
        assert!((f1_score(&y_true, &y_pred) - 2.0 * p * r / (p + r)).abs() < 1e-12);
    }
}
