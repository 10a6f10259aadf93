//! Hypothesis testing.
//!
//! Parametric tests ([`t_test_ind`], [`t_test_rel`], [`anova_oneway`]) and
//! rank-based tests ([`mann_whitney_u`], [`wilcoxon_signed_rank`],
//! [`kruskal_wallis`]). Degenerate input (too few observations, zero
//! variance, all-identical values) is reported as
//! [`PairstatError::InvalidInput`]; no test returns a NaN p-value.

use core::str::FromStr;

use pairstat_core::{PairstatError, Result, Scored, Summarizable};
use statrs::function::factorial::ln_binomial;

use crate::descriptive;
use crate::distribution::{chi_squared_sf, f_sf, normal_sf, t_p_value, z_p_value, Alternative};
use crate::rank::{rank_average, tie_groups, tie_term};

/// Result of a hypothesis test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestResult {
    /// The test statistic (t, U, T, F, H, r).
    pub statistic: f64,
    /// p-value under the requested alternative.
    pub p_value: f64,
    /// Degrees of freedom, if applicable.
    pub degrees_of_freedom: Option<f64>,
    /// Name of the test method.
    pub method: String,
}

impl Scored for TestResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for TestResult {
    fn summary(&self) -> String {
        match self.degrees_of_freedom {
            Some(df) => format!(
                "{}: statistic={:.4}, df={:.1}, p={:.6}",
                self.method, self.statistic, df, self.p_value,
            ),
            None => format!(
                "{}: statistic={:.4}, p={:.6}",
                self.method, self.statistic, self.p_value,
            ),
        }
    }
}

fn invalid(msg: impl Into<String>) -> PairstatError {
    PairstatError::InvalidInput(msg.into())
}

// ── Two-sample t-tests ─────────────────────────────────────────────────────

/// Independent two-sample t-test.
///
/// When `equal_var` is `true`, uses pooled variance (Student's t-test).
/// When `false`, uses Welch's t-test (unequal variances).
pub fn t_test_ind(
    x: &[f64],
    y: &[f64],
    equal_var: bool,
    alternative: Alternative,
) -> Result<TestResult> {
    if x.len() < 2 || y.len() < 2 {
        return Err(invalid("t_test_ind: each group needs at least 2 observations"));
    }

    let nx = x.len() as f64;
    let ny = y.len() as f64;
    let mean_x = descriptive::mean(x)?;
    let mean_y = descriptive::mean(y)?;
    let var_x = descriptive::variance(x, 1)?;
    let var_y = descriptive::variance(y, 1)?;

    let (se, df) = if equal_var {
        let sp2 = ((nx - 1.0) * var_x + (ny - 1.0) * var_y) / (nx + ny - 2.0);
        ((sp2 * (1.0 / nx + 1.0 / ny)).sqrt(), nx + ny - 2.0)
    } else {
        // Welch–Satterthwaite
        let vn_x = var_x / nx;
        let vn_y = var_y / ny;
        let df = (vn_x + vn_y).powi(2) / (vn_x.powi(2) / (nx - 1.0) + vn_y.powi(2) / (ny - 1.0));
        ((vn_x + vn_y).sqrt(), df)
    };
    if !(se > 0.0) {
        return Err(invalid("t_test_ind: both groups have zero variance"));
    }

    let t = (mean_x - mean_y) / se;
    let p = t_p_value(t, df, alternative)?;
    let method = if equal_var {
        "Two-sample t-test (pooled)"
    } else {
        "Welch's t-test"
    };

    Ok(TestResult {
        statistic: t,
        p_value: p,
        degrees_of_freedom: Some(df),
        method: method.into(),
    })
}

/// Paired (related-samples) t-test on `x[i] - y[i]`.
pub fn t_test_rel(x: &[f64], y: &[f64], alternative: Alternative) -> Result<TestResult> {
    if x.len() != y.len() {
        return Err(invalid(format!(
            "t_test_rel: samples must be paired ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(invalid("t_test_rel: need at least 2 pairs"));
    }

    let d: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let n = d.len() as f64;
    let se = descriptive::std_dev(&d, 1)? / n.sqrt();
    if !(se > 0.0) {
        return Err(invalid("t_test_rel: differences have zero variance"));
    }
    let t = descriptive::mean(&d)? / se;
    let df = n - 1.0;

    Ok(TestResult {
        statistic: t,
        p_value: t_p_value(t, df, alternative)?,
        degrees_of_freedom: Some(df),
        method: "Paired t-test".into(),
    })
}

// ── Mann-Whitney U test ────────────────────────────────────────────────────

/// How the Mann-Whitney p-value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MannWhitneyMethod {
    /// Exact when one sample has at most 8 observations and there are no
    /// ties, asymptotic otherwise.
    #[default]
    Auto,
    /// Normal approximation with tie and continuity correction.
    Asymptotic,
    /// Exact null distribution of U.
    Exact,
}

impl FromStr for MannWhitneyMethod {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "asymptotic" => Ok(Self::Asymptotic),
            "exact" => Ok(Self::Exact),
            other => Err(PairstatError::Config(format!(
                "unknown Mann-Whitney method '{other}' (expected auto, asymptotic or exact)"
            ))),
        }
    }
}

/// Mann-Whitney U test (Wilcoxon rank-sum test).
///
/// The statistic is U of the first sample. Each group must be non-empty.
pub fn mann_whitney_u(
    x: &[f64],
    y: &[f64],
    method: MannWhitneyMethod,
    alternative: Alternative,
) -> Result<TestResult> {
    if x.is_empty() || y.is_empty() {
        return Err(invalid("mann_whitney_u: each group must be non-empty"));
    }
    let nx = x.len();
    let ny = y.len();
    let n = (nx + ny) as f64;

    let mut combined: Vec<f64> = Vec::with_capacity(nx + ny);
    combined.extend_from_slice(x);
    combined.extend_from_slice(y);
    let ranks = rank_average(&combined);

    let r1: f64 = ranks[..nx].iter().sum();
    let u1 = r1 - (nx * (nx + 1)) as f64 / 2.0;
    let u2 = (nx * ny) as f64 - u1;
    let ties = tie_term(&combined);

    let use_exact = match method {
        MannWhitneyMethod::Exact => true,
        MannWhitneyMethod::Asymptotic => false,
        MannWhitneyMethod::Auto => (nx <= 8 || ny <= 8) && ties == 0.0,
    };

    // Falls back to the approximation when the count table would overflow.
    let exact = if use_exact { mwu_null_counts(nx, ny) } else { None };

    let p = match exact {
        Some(counts) => {
            let sf = |u: f64| upper_tail(&counts, u.ceil());
            match alternative {
                Alternative::TwoSided => (2.0 * sf(u1.max(u2))).min(1.0),
                Alternative::Greater => sf(u1),
                Alternative::Less => sf(u2),
            }
        }
        None => {
            let mu = (nx * ny) as f64 / 2.0;
            let var = (nx * ny) as f64 / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)));
            if !(var > 0.0) {
                return Err(invalid("mann_whitney_u: all values are identical"));
            }
            let u = match alternative {
                Alternative::TwoSided => u1.max(u2),
                Alternative::Greater => u1,
                Alternative::Less => u2,
            };
            let z = (u - mu - 0.5) / var.sqrt();
            let p = normal_sf(z)?;
            match alternative {
                Alternative::TwoSided => (2.0 * p).min(1.0),
                _ => p,
            }
        }
    };

    Ok(TestResult {
        statistic: u1,
        p_value: p.clamp(0.0, 1.0),
        degrees_of_freedom: None,
        method: "Mann-Whitney U test".into(),
    })
}

/// Number of rank arrangements giving each value of U, for samples of
/// sizes `n1` and `n2`: the coefficients of the Gaussian binomial
/// `[n1 + n2 choose m]_q` with `m = min(n1, n2)`.
///
/// Counts are accumulated in `i128`; returns `None` when they would not fit.
fn mwu_null_counts(n1: usize, n2: usize) -> Option<Vec<f64>> {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    if ln_binomial((m + n) as u64, m as u64) > 85.0 {
        return None;
    }
    let len = m * n + m + 1;
    let mut c = vec![0i128; len];
    c[0] = 1;
    for i in 1..=m {
        // Multiply by (1 - q^(n+i)), then divide by (1 - q^i).
        let a = n + i;
        for u in (a..len).rev() {
            c[u] -= c[u - a];
        }
        for u in i..len {
            c[u] += c[u - i];
        }
    }
    c.truncate(m * n + 1);
    Some(c.into_iter().map(|v| v as f64).collect())
}

/// `P(S >= k)` for a statistic whose null counts are `counts[s]`.
fn upper_tail(counts: &[f64], k: f64) -> f64 {
    let total: f64 = counts.iter().sum();
    let start = if k <= 0.0 { 0 } else { k as usize };
    let tail: f64 = counts.iter().skip(start).sum();
    tail / total
}

// ── Wilcoxon signed-rank test ──────────────────────────────────────────────

/// Treatment of zero differences in the Wilcoxon signed-rank test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ZeroMethod {
    /// Discard zero differences.
    #[default]
    Wilcox,
    /// Rank zero differences, then drop their ranks (more conservative).
    Pratt,
    /// Rank zero differences and split their ranks between both signs.
    Zsplit,
}

impl FromStr for ZeroMethod {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wilcox" => Ok(Self::Wilcox),
            "pratt" => Ok(Self::Pratt),
            "zsplit" => Ok(Self::Zsplit),
            other => Err(PairstatError::Config(format!(
                "unknown zero method '{other}' (expected wilcox, pratt or zsplit)"
            ))),
        }
    }
}

/// How the Wilcoxon p-value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WilcoxonMode {
    /// Exact for at most 50 differences without zeros or ties.
    #[default]
    Auto,
    /// Exact null distribution of the signed-rank sum.
    Exact,
    /// Normal approximation with tie correction.
    Approx,
}

impl FromStr for WilcoxonMode {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "exact" => Ok(Self::Exact),
            "approx" => Ok(Self::Approx),
            other => Err(PairstatError::Config(format!(
                "unknown Wilcoxon mode '{other}' (expected auto, exact or approx)"
            ))),
        }
    }
}

const WILCOXON_EXACT_MAX: usize = 50;

/// Wilcoxon signed-rank test on the paired differences `x[i] - y[i]`.
///
/// The statistic is `min(R+, R-)` for the two-sided test and `R+` for the
/// one-sided tests.
pub fn wilcoxon_signed_rank(
    x: &[f64],
    y: &[f64],
    zero_method: ZeroMethod,
    mode: WilcoxonMode,
    alternative: Alternative,
) -> Result<TestResult> {
    if x.len() != y.len() {
        return Err(invalid(format!(
            "wilcoxon_signed_rank: samples must be paired ({} vs {})",
            x.len(),
            y.len()
        )));
    }

    let mut d: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    if zero_method == ZeroMethod::Wilcox {
        d.retain(|&v| v != 0.0);
    }
    let count = d.len();
    let n_zero = d.iter().filter(|&&v| v == 0.0).count();
    if count == 0 || (zero_method == ZeroMethod::Pratt && n_zero == count) {
        return Err(invalid("wilcoxon_signed_rank: all differences are zero"));
    }

    let abs: Vec<f64> = d.iter().map(|v| v.abs()).collect();
    let ranks = rank_average(&abs);

    let mut r_plus = 0.0;
    let mut r_minus = 0.0;
    let mut r_zero = 0.0;
    for (&di, &r) in d.iter().zip(&ranks) {
        if di > 0.0 {
            r_plus += r;
        } else if di < 0.0 {
            r_minus += r;
        } else {
            r_zero += r;
        }
    }
    if zero_method == ZeroMethod::Zsplit {
        r_plus += r_zero / 2.0;
        r_minus += r_zero / 2.0;
    }

    let statistic = match alternative {
        Alternative::TwoSided => r_plus.min(r_minus),
        _ => r_plus,
    };

    let has_ties = !tie_groups(&abs).is_empty();
    let use_exact = n_zero == 0
        && match mode {
            WilcoxonMode::Exact => true,
            WilcoxonMode::Approx => false,
            WilcoxonMode::Auto => count <= WILCOXON_EXACT_MAX && !has_ties,
        };

    let p = if use_exact {
        let counts = signed_rank_null_counts(count);
        let cdf = |s: f64| 1.0 - upper_tail(&counts, s.floor() + 1.0);
        match alternative {
            Alternative::TwoSided => (2.0 * cdf(statistic)).min(1.0),
            Alternative::Greater => upper_tail(&counts, r_plus.ceil()),
            Alternative::Less => cdf(r_plus),
        }
    } else {
        let nf = count as f64;
        let mut mean = nf * (nf + 1.0) / 4.0;
        let mut var = nf * (nf + 1.0) * (2.0 * nf + 1.0);

        let ranked: Vec<f64> = if zero_method == ZeroMethod::Pratt {
            let z = n_zero as f64;
            mean -= z * (z + 1.0) / 4.0;
            var -= z * (z + 1.0) * (2.0 * z + 1.0);
            d.iter()
                .zip(&ranks)
                .filter(|(&di, _)| di != 0.0)
                .map(|(_, &r)| r)
                .collect()
        } else {
            ranks.clone()
        };
        var -= 0.5 * tie_term(&ranked);
        let se = (var / 24.0).sqrt();
        if !(se > 0.0) {
            return Err(invalid("wilcoxon_signed_rank: zero variance of the rank sum"));
        }

        let z = (statistic - mean) / se;
        z_p_value(z, alternative)?
    };

    Ok(TestResult {
        statistic,
        p_value: p.clamp(0.0, 1.0),
        degrees_of_freedom: None,
        method: "Wilcoxon signed-rank test".into(),
    })
}

/// Number of sign assignments giving each signed-rank sum for `n` ranks.
fn signed_rank_null_counts(n: usize) -> Vec<f64> {
    let max = n * (n + 1) / 2;
    let mut c = vec![0.0; max + 1];
    c[0] = 1.0;
    for k in 1..=n {
        for s in (k..=max).rev() {
            c[s] += c[s - k];
        }
    }
    c
}

// ── One-way ANOVA ─────────────────────────────────────────────────────────

/// One-way analysis of variance (ANOVA).
///
/// Tests whether the means of k groups are equal. Each group must have at
/// least 1 observation, and there must be at least 2 groups.
pub fn anova_oneway(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(invalid("anova_oneway: need at least 2 groups"));
    }
    if let Some(i) = groups.iter().position(|g| g.is_empty()) {
        return Err(invalid(format!("anova_oneway: group {i} is empty")));
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(invalid(
            "anova_oneway: total observations must exceed number of groups",
        ));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let group_mean = g.iter().sum::<f64>() / g.len() as f64;
        ss_between += g.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += g.iter().map(|&x| (x - group_mean).powi(2)).sum::<f64>();
    }
    if !(ss_within > 0.0) {
        return Err(invalid("anova_oneway: zero within-group variance"));
    }

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    let f_stat = (ss_between / df_between) / (ss_within / df_within);

    Ok(TestResult {
        statistic: f_stat,
        p_value: f_sf(f_stat, df_between, df_within)?,
        degrees_of_freedom: Some(df_between),
        method: "One-way ANOVA".into(),
    })
}

// ── Kruskal-Wallis H test ─────────────────────────────────────────────────

/// Kruskal-Wallis H test, tie-corrected.
///
/// Non-parametric counterpart of [`anova_oneway`]; `H ~ χ²(k − 1)`.
pub fn kruskal_wallis(groups: &[&[f64]]) -> Result<TestResult> {
    let k = groups.len();
    if k < 2 {
        return Err(invalid("kruskal_wallis: need at least 2 groups"));
    }
    if let Some(i) = groups.iter().position(|g| g.is_empty()) {
        return Err(invalid(format!("kruskal_wallis: group {i} is empty")));
    }

    let combined: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = combined.len() as f64;
    let ranks = rank_average(&combined);

    let mut h = 0.0;
    let mut offset = 0;
    for g in groups {
        let r: f64 = ranks[offset..offset + g.len()].iter().sum();
        h += r * r / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_term(&combined) / (n * n * n - n);
    if !(correction > 0.0) {
        return Err(invalid("kruskal_wallis: all numbers are identical"));
    }
    h /= correction;

    let df = (k - 1) as f64;
    Ok(TestResult {
        statistic: h,
        p_value: chi_squared_sf(h, df)?,
        degrees_of_freedom: Some(df),
        method: "Kruskal-Wallis H test".into(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────
