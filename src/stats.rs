//! Two-sample statistical tests used by drift detection

use std::collections::BTreeMap;

const SERIES_MAX_ITER: usize = 200;
const SERIES_EPS: f64 = 3.0e-14;
const FPMIN: f64 = 1.0e-300;

/// Test statistic plus p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    /// Test statistic
    pub statistic: f64,
    /// Probability of a statistic at least this extreme under the null
    pub p_value: f64,
}

/// Two-sample Kolmogorov-Smirnov test with the asymptotic p-value.
///
/// Empty samples yield statistic 0 and p-value 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> TestOutcome {
    if reference.is_empty() || current.is_empty() {
        return TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
        };
    }

    let mut a = reference.to_vec();
    let mut b = current.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut statistic: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let value = a[i].min(b[j]);
        while i < a.len() && a[i] <= value {
            i += 1;
        }
        while j < b.len() && b[j] <= value {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n - j as f64 / m).abs());
    }

    let en = (n * m / (n + m)).sqrt();
    let p_value = kolmogorov_q((en + 0.12 + 0.11 / en) * statistic);
    TestOutcome { statistic, p_value }
}

/// Kolmogorov survival function `Q_KS(λ) = 2 Σ (-1)^(j-1) exp(-2 j² λ²)`
#[must_use]
pub fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1.0e-3;
    const EPS2: f64 = 1.0e-8;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous: f64 = 0.0;
    for j in 1..=100_i32 {
        let term = fac * (a2 * f64::from(j * j)).exp();
        sum += term;
        if term.abs() <= EPS1 * previous || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    // No convergence: λ is tiny and the distributions are indistinguishable
    1.0
}

/// Pearson chi-square homogeneity test on two categorical samples.
///
/// Categories are the union of both samples; degrees of freedom are
/// `categories - 1`. A single shared category yields statistic 0, p-value 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn chi_square_two_sample(reference: &[String], current: &[String]) -> TestOutcome {
    let mut counts: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for value in reference {
        counts.entry(value.as_str()).or_default().0 += 1.0;
    }
    for value in current {
        counts.entry(value.as_str()).or_default().1 += 1.0;
    }

    let (n_ref, n_cur) = (reference.len() as f64, current.len() as f64);
    let total = n_ref + n_cur;
    if counts.len() < 2 || n_ref == 0.0 || n_cur == 0.0 {
        return TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
        };
    }

    let statistic: f64 = counts
        .values()
        .map(|&(observed_ref, observed_cur)| {
            let column_total = observed_ref + observed_cur;
            let expected_ref = n_ref * column_total / total;
            let expected_cur = n_cur * column_total / total;
            (observed_ref - expected_ref).powi(2) / expected_ref
                + (observed_cur - expected_cur).powi(2) / expected_cur
        })
        .sum();

    let dof = (counts.len() - 1) as f64;
    TestOutcome {
        statistic,
        p_value: regularized_gamma_q(dof / 2.0, statistic / 2.0),
    }
}

/// Natural log of the gamma function (Lanczos approximation, x > 0)
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let tmp = x + 5.5;
    let tmp = (x + 0.5).mul_add(tmp.ln(), -tmp);
    let mut series = 1.000_000_000_190_015;
    let mut y = x;
    for c in COEFFICIENTS {
        y += 1.0;
        series += c / y;
    }
    tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

/// Regularized upper incomplete gamma `Q(a, x) = 1 - P(a, x)`
#[must_use]
pub fn regularized_gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 || a <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut delta = 1.0 / a;
    let mut sum = delta;
    for _ in 0..SERIES_MAX_ITER {
        ap += 1.0;
        delta *= x / ap;
        sum += delta;
        if delta.abs() < sum.abs() * SERIES_EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=SERIES_MAX_ITER {
        #[allow(clippy::cast_precision_loss)]
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an.mul_add(d, b);
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < SERIES_EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}
