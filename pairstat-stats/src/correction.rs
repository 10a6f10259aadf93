//! Multiple testing correction.
//!
//! When running many hypothesis tests simultaneously, p-values must be
//! adjusted to control the family-wise error rate or false discovery rate.
//! Every method here follows the `multipletests` conventions: adjusted
//! values are returned in input order and clipped to at most 1.
//!
//! `NaN` p-values (comparisons that could not be computed) pass through
//! unchanged and do not count toward the number of tests.

use core::fmt;
use core::str::FromStr;

use pairstat_core::{PairstatError, Result};

/// Multiple testing correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CorrectionMethod {
    /// Bonferroni correction, controls FWER.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "bonferroni"))]
    Bonferroni,
    /// Benjamini-Hochberg step-up procedure, controls FDR.
    #[cfg_attr(feature = "serde", serde(rename = "fdr_bh"))]
    BenjaminiHochberg,
    /// Benjamini-Yekutieli, FDR under arbitrary dependence.
    #[cfg_attr(feature = "serde", serde(rename = "fdr_by"))]
    BenjaminiYekutieli,
    /// Two-stage Benjamini-Hochberg.
    #[cfg_attr(feature = "serde", serde(rename = "fdr_tsbh"))]
    TwoStageBenjaminiHochberg,
    /// Two-stage Benjamini-Krieger-Yekutieli.
    #[cfg_attr(feature = "serde", serde(rename = "fdr_tsbky"))]
    TwoStageBenjaminiKriegerYekutieli,
    /// Šidák single-step correction.
    #[cfg_attr(feature = "serde", serde(rename = "sidak"))]
    Sidak,
    /// Holm step-down with Šidák adjustments.
    #[cfg_attr(feature = "serde", serde(rename = "holm-sidak"))]
    HolmSidak,
    /// Holm step-down (Bonferroni adjustments).
    #[cfg_attr(feature = "serde", serde(rename = "holm"))]
    Holm,
    /// Simes-Hochberg step-up.
    #[cfg_attr(feature = "serde", serde(rename = "simes-hochberg"))]
    SimesHochberg,
    /// Hommel closed procedure based on Simes tests.
    #[cfg_attr(feature = "serde", serde(rename = "hommel"))]
    Hommel,
}

impl CorrectionMethod {
    /// All methods, in the order they are listed in option files.
    pub const ALL: [CorrectionMethod; 10] = [
        CorrectionMethod::Bonferroni,
        CorrectionMethod::BenjaminiHochberg,
        CorrectionMethod::BenjaminiYekutieli,
        CorrectionMethod::TwoStageBenjaminiHochberg,
        CorrectionMethod::TwoStageBenjaminiKriegerYekutieli,
        CorrectionMethod::Sidak,
        CorrectionMethod::HolmSidak,
        CorrectionMethod::Holm,
        CorrectionMethod::SimesHochberg,
        CorrectionMethod::Hommel,
    ];

    /// Option-file name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::BenjaminiHochberg => "fdr_bh",
            CorrectionMethod::BenjaminiYekutieli => "fdr_by",
            CorrectionMethod::TwoStageBenjaminiHochberg => "fdr_tsbh",
            CorrectionMethod::TwoStageBenjaminiKriegerYekutieli => "fdr_tsbky",
            CorrectionMethod::Sidak => "sidak",
            CorrectionMethod::HolmSidak => "holm-sidak",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::SimesHochberg => "simes-hochberg",
            CorrectionMethod::Hommel => "hommel",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionMethod {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        CorrectionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                PairstatError::Config(format!("unknown correction method '{s}'"))
            })
    }
}

/// Apply a multiple testing correction to `p_values`.
///
/// `alpha` is the family-wise error rate; only the two-stage FDR methods
/// depend on it. Returns a new `Vec<f64>` of adjusted p-values in the same
/// order as the input.
pub fn correct(p_values: &[f64], method: CorrectionMethod, alpha: f64) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PairstatError::Config(format!(
            "alpha must be in [0, 1], got {alpha}"
        )));
    }

    // Sort indices of the defined p-values.
    let mut indices: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    indices.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
    let sorted: Vec<f64> = indices.iter().map(|&i| p_values[i]).collect();

    let adjusted_sorted = adjust_sorted(&sorted, method, alpha);

    let mut adjusted = vec![f64::NAN; p_values.len()];
    for (&idx, adj) in indices.iter().zip(adjusted_sorted) {
        adjusted[idx] = adj.min(1.0);
    }
    Ok(adjusted)
}

/// Bonferroni correction: `p_adj = min(p * n, 1.0)`.
pub fn bonferroni(p_values: &[f64]) -> Result<Vec<f64>> {
    correct(p_values, CorrectionMethod::Bonferroni, 0.05)
}

/// Benjamini-Hochberg procedure for controlling the false discovery rate.
pub fn benjamini_hochberg(p_values: &[f64]) -> Result<Vec<f64>> {
    correct(p_values, CorrectionMethod::BenjaminiHochberg, 0.05)
}

fn adjust_sorted(p: &[f64], method: CorrectionMethod, alpha: f64) -> Vec<f64> {
    let n = p.len();
    let n_f = n as f64;
    if n == 0 {
        return Vec::new();
    }

    match method {
        CorrectionMethod::Bonferroni => p.iter().map(|&v| v * n_f).collect(),
        CorrectionMethod::Sidak => p.iter().map(|&v| sidak(v, n_f)).collect(),
        CorrectionMethod::Holm => cumulative_max(
            p.iter()
                .enumerate()
                .map(|(i, &v)| v * (n - i) as f64)
                .collect(),
        ),
        CorrectionMethod::HolmSidak => cumulative_max(
            p.iter()
                .enumerate()
                .map(|(i, &v)| sidak(v, (n - i) as f64))
                .collect(),
        ),
        CorrectionMethod::SimesHochberg => cumulative_min_from_end(
            p.iter()
                .enumerate()
                .map(|(i, &v)| v * (n - i) as f64)
                .collect(),
        ),
        CorrectionMethod::Hommel => hommel(p),
        CorrectionMethod::BenjaminiHochberg => fdr_bh(p),
        CorrectionMethod::BenjaminiYekutieli => {
            let cm: f64 = (1..=n).map(|k| 1.0 / k as f64).sum();
            fdr_bh(p).into_iter().map(|v| v * cm).collect()
        }
        CorrectionMethod::TwoStageBenjaminiHochberg => fdr_two_stage(p, alpha, false),
        CorrectionMethod::TwoStageBenjaminiKriegerYekutieli => fdr_two_stage(p, alpha, true),
    }
}

/// `1 − (1 − p)^m`, computed without cancellation for small `p`.
fn sidak(p: f64, m: f64) -> f64 {
    -(m * (-p).ln_1p()).exp_m1()
}

fn cumulative_max(mut v: Vec<f64>) -> Vec<f64> {
    let mut running = f64::NEG_INFINITY;
    for x in v.iter_mut() {
        running = running.max(*x);
        *x = running;
    }
    v
}

fn cumulative_min_from_end(mut v: Vec<f64>) -> Vec<f64> {
    let mut running = f64::INFINITY;
    for x in v.iter_mut().rev() {
        running = running.min(*x);
        *x = running;
    }
    v
}

/// BH adjustment of ascending p-values: `p * n / rank`, then monotone
/// from right to left. Not clipped.
fn fdr_bh(p: &[f64]) -> Vec<f64> {
    let n_f = p.len() as f64;
    cumulative_min_from_end(
        p.iter()
            .enumerate()
            .map(|(i, &v)| v * n_f / (i + 1) as f64)
            .collect(),
    )
}

/// Single-iteration two-stage FDR. The first stage estimates the number of
/// true nulls from the BH rejections at `alpha'`; the second rescales.
fn fdr_two_stage(p: &[f64], alpha: f64, bky: bool) -> Vec<f64> {
    let n_f = p.len() as f64;
    let (fact, alpha_prime) = if bky {
        (1.0 + alpha, alpha / (1.0 + alpha))
    } else {
        (1.0, alpha)
    };

    let bh = fdr_bh(p);
    let r1 = bh.iter().filter(|&&v| v <= alpha_prime).count();
    if r1 == 0 || r1 == p.len() {
        return bh.into_iter().map(|v| v * fact).collect();
    }

    let n0 = n_f - r1 as f64;
    bh.into_iter().map(|v| v * n0 / n_f * fact).collect()
}

/// Hommel's procedure on ascending p-values.
fn hommel(p: &[f64]) -> Vec<f64> {
    let n = p.len();
    let mut a = p.to_vec();
    for m in (2..=n).rev() {
        let tail = n - m;
        let m_f = m as f64;
        let cim = p[tail..]
            .iter()
            .enumerate()
            .map(|(k, &v)| m_f * v / (k + 1) as f64)
            .fold(f64::INFINITY, f64::min);
        for v in a[tail..].iter_mut() {
            *v = v.max(cim);
        }
        for (v, &pj) in a[..tail].iter_mut().zip(&p[..tail]) {
            *v = v.max((m_f * pj).min(cim));
        }
    }
    a
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    for (i, &p) in p_values.iter().enumerate() {
        if !p.is_nan() && !(0.0..=1.0).contains(&p) {
            return Err(PairstatError::InvalidInput(format!(
                "p-value at index {} is out of range [0, 1]: {}",
                i, p,
            )));
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
