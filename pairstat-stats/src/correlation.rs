//! Correlation analysis.
//!
//! Pearson and Spearman correlation coefficients, and the matching
//! significance tests against the null of no correlation.

use pairstat_core::{PairstatError, Result};

use crate::distribution::{t_p_value, Alternative};
use crate::rank::rank_average;
use crate::testing::TestResult;

/// Pearson product-moment correlation coefficient between `x` and `y`.
///
/// Constant series have no defined correlation and are rejected.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_paired(x, y)?;

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if !(denom > 0.0) {
        return Err(PairstatError::InvalidInput(
            "correlation: input is constant, coefficient undefined".into(),
        ));
    }
    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// Spearman rank correlation coefficient between `x` and `y`.
///
/// Pearson correlation of the average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_paired(x, y)?;
    pearson(&rank_average(x), &rank_average(y))
}

/// Pearson correlation with a two-sided p-value.
pub fn pearson_test(x: &[f64], y: &[f64]) -> Result<TestResult> {
    let r = pearson(x, y)?;
    correlation_test(r, x.len(), "Pearson correlation")
}

/// Spearman correlation with a two-sided p-value.
pub fn spearman_test(x: &[f64], y: &[f64]) -> Result<TestResult> {
    let rho = spearman(x, y)?;
    correlation_test(rho, x.len(), "Spearman correlation")
}

/// p-value of a correlation coefficient via `t = r·√(df / (1 − r²))`,
/// `df = n − 2`.
fn correlation_test(r: f64, n: usize, method: &str) -> Result<TestResult> {
    let df = n as f64 - 2.0;
    let p_value = if n == 2 {
        // Two points always lie on a line.
        1.0
    } else if r.abs() >= 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        t_p_value(t, df, Alternative::TwoSided)?
    };
    Ok(TestResult {
        statistic: r,
        p_value,
        degrees_of_freedom: Some(df),
        method: method.into(),
    })
}

fn validate_paired(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(PairstatError::InvalidInput(format!(
            "correlation: x and y must have the same length ({} vs {})",
            x.len(),
            y.len(),
        )));
    }
    if x.len() < 2 {
        return Err(PairstatError::InvalidInput(
            "correlation: need at least 2 observations".into(),
        ));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
