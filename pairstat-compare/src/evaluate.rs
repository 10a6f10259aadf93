//! Evaluation of one statistic over the enumerated pairs.

use pairstat_core::{PairstatError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompareOptions;
use crate::enumerate::ComparisonPair;
use crate::missing::{MissingPolicy, MissingValueFilter, PairData};

/// What happens when a statistic fails on one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record `(NaN, NaN)` for the pair and continue.
    #[default]
    Lenient,
    /// Abort the whole batch.
    Strict,
}

/// A pairwise test: two samples in, `(statistic, p_value)` out.
///
/// Implementations never see the table; they receive the samples after
/// missing-value handling. Returning `Err` marks the comparison as
/// degenerate.
pub trait PairwiseStatistic {
    fn compute(&self, data: &PairData, reference: &str, target: &str) -> Result<(f64, f64)>;

    /// Name of the test, for logs and summaries.
    fn label(&self) -> &str {
        "custom"
    }

    /// Label of the statistic value (e.g. `"U-Statistic"`).
    fn statistic_name(&self) -> &str {
        "Statistic"
    }

    /// Smallest sample the test accepts. Smaller samples yield `NaN`
    /// without calling [`compute`](Self::compute).
    fn min_samples(&self) -> usize {
        1
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::RemovePairwise
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Lenient
    }
}

impl<F> PairwiseStatistic for F
where
    F: Fn(&PairData, &str, &str) -> Result<(f64, f64)>,
{
    fn compute(&self, data: &PairData, reference: &str, target: &str) -> Result<(f64, f64)> {
        self(data, reference, target)
    }
}

/// Raw outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub reference: String,
    pub target: String,
    pub statistic: f64,
    /// In `[0, 1]`, or `NaN` for a degenerate comparison.
    pub p_value: f64,
    /// Group values of both sides, in row-tag mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<(String, String)>,
}

impl ComparisonResult {
    pub fn is_degenerate(&self) -> bool {
        self.p_value.is_nan()
    }
}

/// Batch-scoped evaluator; results accumulate in one buffer.
pub struct Evaluator<'s, S: PairwiseStatistic + ?Sized> {
    statistic: &'s S,
    filter: MissingValueFilter,
    failure: FailurePolicy,
    results: Vec<ComparisonResult>,
}

impl<'s, S: PairwiseStatistic + ?Sized> Evaluator<'s, S> {
    /// Policies from `options` override the statistic's own.
    pub fn new(statistic: &'s S, options: &CompareOptions) -> Self {
        let missing = options
            .missing_values
            .unwrap_or_else(|| statistic.missing_policy());
        Self {
            statistic,
            filter: MissingValueFilter::new(missing),
            failure: options
                .failure
                .unwrap_or_else(|| statistic.failure_policy()),
            results: Vec::new(),
        }
    }

    /// Reserve room for `additional` more results.
    pub fn reserve(&mut self, additional: usize) {
        self.results.reserve(additional);
    }

    /// Compute one pair and append its result.
    ///
    /// Only fails under [`FailurePolicy::Strict`], when the statistic errors
    /// or returns a p-value outside `[0, 1]`.
    pub fn evaluate(&mut self, pair: &ComparisonPair<'_>) -> Result<()> {
        let data = if pair.is_paired() {
            self.filter.apply(pair.x, pair.y)
        } else {
            self.filter.apply_unpaired(pair.x, pair.y)
        };
        let min = self.statistic.min_samples();

        let (statistic, p_value) = if data.min_len() < min {
            debug!(
                reference = pair.reference,
                target = pair.target,
                n = data.min_len(),
                min,
                "too few observations, recording NaN"
            );
            (f64::NAN, f64::NAN)
        } else {
            match self.statistic.compute(&data, pair.reference, pair.target) {
                Ok((s, p)) if p.is_nan() || (0.0..=1.0).contains(&p) => (s, p),
                Ok((_, p)) => self.degenerate(pair, format!("p-value {p} outside [0, 1]"))?,
                Err(e) => self.degenerate(pair, e.to_string())?,
            }
        };

        self.results.push(ComparisonResult {
            reference: pair.reference.to_string(),
            target: pair.target.to_string(),
            statistic,
            p_value,
            groups: pair
                .groups
                .map(|(a, b)| (a.to_string(), b.to_string())),
        });
        Ok(())
    }

    /// `(NaN, NaN)` under [`FailurePolicy::Lenient`], an error otherwise.
    fn degenerate(&self, pair: &ComparisonPair<'_>, message: String) -> Result<(f64, f64)> {
        match self.failure {
            FailurePolicy::Lenient => {
                debug!(
                    reference = pair.reference,
                    target = pair.target,
                    reason = %message,
                    "degenerate comparison, recording NaN"
                );
                Ok((f64::NAN, f64::NAN))
            }
            FailurePolicy::Strict => Err(PairstatError::Statistic {
                reference: pair.reference.to_string(),
                target: pair.target.to_string(),
                message,
            }),
        }
    }

    /// Whether missing values were seen in this batch.
    pub fn saw_missing_values(&self) -> bool {
        self.filter.has_warned()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn finish(self) -> Vec<ComparisonResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair<'a>(x: &'a [f64], y: &'a [f64]) -> ComparisonPair<'a> {
        ComparisonPair {
            reference: "A",
            target: "B",
            x,
            y,
            groups: None,
        }
    }

    fn mean_difference(d: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        let mx = d.x.iter().sum::<f64>() / d.x.len() as f64;
        let my = d.y.iter().sum::<f64>() / d.y.len() as f64;
        Ok((mx - my, 0.5))
    }

    fn failing(_: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        Err(PairstatError::InvalidInput("all values are identical".into()))
    }

    #[test]
    fn closure_statistic() {
        let opts = CompareOptions::default();
        let mut ev = Evaluator::new(&mean_difference, &opts);
        ev.evaluate(&pair(&[1.0, 2.0], &[3.0, 4.0])).unwrap();
        let r = ev.finish();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].statistic, -2.0);
        assert_eq!(r[0].p_value, 0.5);
        assert_eq!(r[0].reference, "A");
    }

    #[test]
    fn lenient_failure_records_nan() {
        let opts = CompareOptions::default();
        let mut ev = Evaluator::new(&failing, &opts);
        ev.evaluate(&pair(&[1.0], &[1.0])).unwrap();
        let r = ev.finish();
        assert!(r[0].statistic.is_nan());
        assert!(r[0].is_degenerate());
    }

    #[test]
    fn strict_failure_aborts() {
        let opts = CompareOptions::default().with_failure(FailurePolicy::Strict);
        let mut ev = Evaluator::new(&failing, &opts);
        let err = ev.evaluate(&pair(&[1.0], &[1.0])).unwrap_err();
        assert!(matches!(err, PairstatError::Statistic { .. }));
        assert!(err.to_string().contains("'A' vs 'B'"));
    }

    #[test]
    fn empty_overlap_skips_statistic() {
        let nan = f64::NAN;
        let opts = CompareOptions::default().with_failure(FailurePolicy::Strict);
        let mut ev = Evaluator::new(&failing, &opts);
        // Never reaches the failing statistic.
        ev.evaluate(&pair(&[nan, 1.0], &[2.0, nan])).unwrap();
        assert!(ev.saw_missing_values());
        assert!(ev.finish()[0].p_value.is_nan());
    }

    #[test]
    fn out_of_range_p_is_degenerate() {
        let bad = |_: &PairData, _: &str, _: &str| -> Result<(f64, f64)> { Ok((1.0, 1.5)) };
        let opts = CompareOptions::default();
        let mut ev = Evaluator::new(&bad, &opts);
        ev.evaluate(&pair(&[1.0], &[2.0])).unwrap();
        let r = ev.finish();
        assert!(r[0].statistic.is_nan());
        assert!(r[0].p_value.is_nan());
    }

    #[test]
    fn strict_out_of_range_p_aborts() {
        let bad = |_: &PairData, _: &str, _: &str| -> Result<(f64, f64)> { Ok((1.0, -0.2)) };
        let opts = CompareOptions::default().with_failure(FailurePolicy::Strict);
        let mut ev = Evaluator::new(&bad, &opts);
        let err = ev.evaluate(&pair(&[1.0], &[2.0])).unwrap_err();
        assert!(matches!(err, PairstatError::Statistic { .. }));
        assert!(err.to_string().contains("outside [0, 1]"));
        assert!(ev.is_empty());
    }

    #[test]
    fn grouped_pairs_keep_uneven_samples() {
        let opts = CompareOptions::default();
        let mut ev = Evaluator::new(&mean_difference, &opts);
        ev.reserve(1);
        let mut p = pair(&[2.0, 3.0, 4.0], &[1.0]);
        p.groups = Some(("F", "M"));
        ev.evaluate(&p).unwrap();
        assert!(!ev.saw_missing_values());
        assert_eq!(ev.finish()[0].statistic, 2.0);
    }

    #[test]
    fn options_override_statistic_policy() {
        struct Each;
        impl PairwiseStatistic for Each {
            fn compute(&self, d: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
                Ok((d.x.len() as f64, d.y.len() as f64 / 10.0))
            }
            fn missing_policy(&self) -> MissingPolicy {
                MissingPolicy::RemoveEach
            }
        }
        let nan = f64::NAN;
        let x = [1.0, nan, 3.0];
        let y = [nan, 5.0, 6.0];

        let mut own = Evaluator::new(&Each, &CompareOptions::default());
        own.evaluate(&pair(&x, &y)).unwrap();
        assert_eq!(own.finish()[0].statistic, 2.0);

        let opts = CompareOptions::default().with_missing_values(MissingPolicy::RemovePairwise);
        let mut overridden = Evaluator::new(&Each, &opts);
        overridden.evaluate(&pair(&x, &y)).unwrap();
        assert_eq!(overridden.finish()[0].statistic, 1.0);
    }

    #[test]
    fn group_metadata_carried() {
        let opts = CompareOptions::default();
        let mut ev = Evaluator::new(&mean_difference, &opts);
        let mut p = pair(&[1.0], &[2.0]);
        p.groups = Some(("F", "M"));
        ev.evaluate(&p).unwrap();
        assert_eq!(
            ev.finish()[0].groups,
            Some(("F".to_string(), "M".to_string()))
        );
    }
}
