//! Concrete pairwise tests.
//!
//! Each type wraps one test from `pairstat_stats` and fixes its missing-value
//! and failure policies. The statistic names are the column labels the tests
//! have always reported.

use pairstat_core::Result;
use pairstat_stats::correlation::{pearson_test, spearman_test};
use pairstat_stats::testing::{
    anova_oneway, kruskal_wallis, mann_whitney_u, t_test_ind, t_test_rel, wilcoxon_signed_rank,
    MannWhitneyMethod, WilcoxonMode, ZeroMethod,
};
use pairstat_stats::{Alternative, TestResult};
use serde::{Deserialize, Serialize};

use crate::evaluate::{FailurePolicy, PairwiseStatistic};
use crate::missing::{MissingPolicy, PairData};

fn pair_of(result: TestResult) -> (f64, f64) {
    (result.statistic, result.p_value)
}

/// One-way ANOVA between the two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anova;

impl PairwiseStatistic for Anova {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        anova_oneway(&[data.x.as_slice(), data.y.as_slice()]).map(pair_of)
    }

    fn label(&self) -> &str {
        "ANOVA"
    }

    fn statistic_name(&self) -> &str {
        "F-Statistic"
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::RemoveEach
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Strict
    }
}

/// Kruskal-Wallis H test between the two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KruskalWallis;

impl PairwiseStatistic for KruskalWallis {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        kruskal_wallis(&[data.x.as_slice(), data.y.as_slice()]).map(pair_of)
    }

    fn label(&self) -> &str {
        "Kruskal-Wallis"
    }

    fn statistic_name(&self) -> &str {
        "H-Statistic"
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::RemoveEach
    }
}

/// Independent two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TTestInd {
    /// Pooled variance when `true`, Welch's test otherwise.
    pub equal_variance: bool,
    pub alternative: Alternative,
}

impl Default for TTestInd {
    fn default() -> Self {
        Self {
            equal_variance: true,
            alternative: Alternative::TwoSided,
        }
    }
}

impl PairwiseStatistic for TTestInd {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        t_test_ind(&data.x, &data.y, self.equal_variance, self.alternative).map(pair_of)
    }

    fn label(&self) -> &str {
        if self.equal_variance {
            "Student t-test"
        } else {
            "Welch t-test"
        }
    }

    fn statistic_name(&self) -> &str {
        "T-Statistic"
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::RemoveEach
    }
}

/// Paired t-test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TTestRel {
    pub alternative: Alternative,
}

impl PairwiseStatistic for TTestRel {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        t_test_rel(&data.x, &data.y, self.alternative).map(pair_of)
    }

    fn label(&self) -> &str {
        "Paired t-test"
    }

    fn statistic_name(&self) -> &str {
        "TStatistic"
    }

    fn min_samples(&self) -> usize {
        2
    }
}

/// Mann-Whitney U test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MannWhitney {
    pub method: MannWhitneyMethod,
    pub alternative: Alternative,
}

impl PairwiseStatistic for MannWhitney {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        mann_whitney_u(&data.x, &data.y, self.method, self.alternative).map(pair_of)
    }

    fn label(&self) -> &str {
        "Mann-Whitney"
    }

    fn statistic_name(&self) -> &str {
        "U-Statistic"
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::RemoveEach
    }
}

/// Wilcoxon signed-rank test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wilcoxon {
    pub zero_method: ZeroMethod,
    pub alternative: Alternative,
    pub mode: WilcoxonMode,
}

impl PairwiseStatistic for Wilcoxon {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        wilcoxon_signed_rank(
            &data.x,
            &data.y,
            self.zero_method,
            self.mode,
            self.alternative,
        )
        .map(pair_of)
    }

    fn label(&self) -> &str {
        "Wilcoxon"
    }

    fn statistic_name(&self) -> &str {
        "TStatistic"
    }
}

/// Pearson correlation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pearson;

impl PairwiseStatistic for Pearson {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        pearson_test(&data.x, &data.y).map(pair_of)
    }

    fn label(&self) -> &str {
        "Pearson"
    }

    fn statistic_name(&self) -> &str {
        "Correlation"
    }

    fn min_samples(&self) -> usize {
        2
    }
}

/// Spearman rank correlation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spearman;

impl PairwiseStatistic for Spearman {
    fn compute(&self, data: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        spearman_test(&data.x, &data.y).map(pair_of)
    }

    fn label(&self) -> &str {
        "Spearman"
    }

    fn statistic_name(&self) -> &str {
        "Correlation"
    }

    fn min_samples(&self) -> usize {
        2
    }
}

/// Coefficient used by [`Correlation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
}

/// Correlation with a configurable coefficient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Correlation {
    pub method: CorrelationMethod,
}

impl PairwiseStatistic for Correlation {
    fn compute(&self, data: &PairData, reference: &str, target: &str) -> Result<(f64, f64)> {
        match self.method {
            CorrelationMethod::Pearson => Pearson.compute(data, reference, target),
            CorrelationMethod::Spearman => Spearman.compute(data, reference, target),
        }
    }

    fn label(&self) -> &str {
        match self.method {
            CorrelationMethod::Pearson => "Pearson",
            CorrelationMethod::Spearman => "Spearman",
        }
    }

    fn min_samples(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn data(x: &[f64], y: &[f64]) -> PairData {
        PairData::new(x.to_vec(), y.to_vec())
    }

    #[test]
    fn statistic_labels() {
        assert_eq!(Anova.statistic_name(), "F-Statistic");
        assert_eq!(KruskalWallis.statistic_name(), "H-Statistic");
        assert_eq!(TTestInd::default().statistic_name(), "T-Statistic");
        assert_eq!(TTestRel::default().statistic_name(), "TStatistic");
        assert_eq!(MannWhitney::default().statistic_name(), "U-Statistic");
        assert_eq!(Wilcoxon::default().statistic_name(), "TStatistic");
        assert_eq!(Pearson.statistic_name(), "Correlation");
        assert_eq!(Spearman.statistic_name(), "Correlation");
        assert_eq!(Correlation::default().statistic_name(), "Statistic");
    }

    #[test]
    fn policies() {
        assert_eq!(Anova.failure_policy(), FailurePolicy::Strict);
        assert_eq!(Pearson.failure_policy(), FailurePolicy::Lenient);
        assert_eq!(MannWhitney::default().missing_policy(), MissingPolicy::RemoveEach);
        assert_eq!(TTestRel::default().missing_policy(), MissingPolicy::RemovePairwise);
        assert_eq!(Wilcoxon::default().missing_policy(), MissingPolicy::RemovePairwise);
    }

    #[test]
    fn anova_matches_t_squared() {
        let d = data(&[1.0, 2.0, 3.0, 4.0, 5.0], &[3.0, 4.0, 5.0, 6.0, 7.0]);
        let (f, pf) = Anova.compute(&d, "A", "B").unwrap();
        let (t, pt) = TTestInd::default().compute(&d, "A", "B").unwrap();
        assert!((f - t * t).abs() < TOL);
        assert!((pf - pt).abs() < 1e-6);
    }

    #[test]
    fn mann_whitney_small_exact() {
        let d = data(&[1.0, 2.0, 3.0, 4.0, 5.0], &[100.0, 101.0, 102.0, 103.0, 104.0]);
        let (u, p) = MannWhitney::default().compute(&d, "A", "B").unwrap();
        assert_eq!(u, 0.0);
        assert!((p - 2.0 / 252.0).abs() < TOL);
    }

    #[test]
    fn correlation_dispatch() {
        let d = data(&[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 9.0, 16.0]);
        let spearman = Correlation {
            method: CorrelationMethod::Spearman,
        };
        let (rho, _) = spearman.compute(&d, "A", "B").unwrap();
        assert!((rho - 1.0).abs() < TOL);
        let (r, _) = Correlation::default().compute(&d, "A", "B").unwrap();
        assert!(r < 1.0 && r > 0.9);
        assert_eq!(spearman.label(), "Spearman");
    }

    #[test]
    fn wilcoxon_paired() {
        let x: Vec<f64> = (1..=8).map(|v| v as f64 * 2.0).collect();
        let y: Vec<f64> = (1..=8).map(f64::from).collect();
        let (t, p) = Wilcoxon::default().compute(&data(&x, &y), "A", "B").unwrap();
        assert_eq!(t, 0.0);
        assert!((p - 2.0 / 256.0).abs() < TOL);
    }

    #[test]
    fn degenerate_input_errors() {
        let constant = data(&[1.0, 1.0, 1.0], &[2.0, 3.0, 4.0]);
        assert!(Pearson.compute(&constant, "A", "B").is_err());
        let same = data(&[1.0, 2.0], &[1.0, 2.0]);
        assert!(TTestRel::default().compute(&same, "A", "B").is_err());
    }

    #[test]
    fn options_deserialize() {
        let t: TTestInd = toml::from_str("equal_variance = false\nalternative = \"less\"").unwrap();
        assert!(!t.equal_variance);
        assert_eq!(t.alternative, Alternative::Less);
        assert_eq!(t.label(), "Welch t-test");

        let w: Wilcoxon = toml::from_str("zero_method = \"pratt\"").unwrap();
        assert_eq!(w.zero_method, ZeroMethod::Pratt);
        assert_eq!(w.mode, WilcoxonMode::Auto);
    }
}
