//! Missing-value handling for one comparison batch.
//!
//! A missing value is a `NaN` cell, either missing in the source or failed
//! numeric coercion. Samples drawn from different row-tag groups share no
//! rows, so pairwise removal drops their missing values per sample.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do with missing values before a statistic sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop every row where either value is missing. Keeps pairs aligned.
    #[default]
    RemovePairwise,
    /// Drop missing values from each sample independently.
    RemoveEach,
    /// Pass the values through untouched.
    Propagate,
}

/// The two samples handed to a statistic.
///
/// Aligned (equal length, row `i` of `x` pairs with row `i` of `y`) unless
/// produced under [`MissingPolicy::RemoveEach`] or from unpaired samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PairData {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    /// Size of the smaller sample.
    pub fn min_len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    pub fn is_aligned(&self) -> bool {
        self.x.len() == self.y.len()
    }
}

/// Applies a [`MissingPolicy`] to every pair of a batch, warning once.
#[derive(Debug)]
pub struct MissingValueFilter {
    policy: MissingPolicy,
    warned: bool,
}

impl MissingValueFilter {
    pub fn new(policy: MissingPolicy) -> Self {
        Self {
            policy,
            warned: false,
        }
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    /// Whether the batch warning has been emitted.
    pub fn has_warned(&self) -> bool {
        self.warned
    }

    /// Prepare `x` and `y` for the statistic.
    ///
    /// Samples of unequal length are treated as padded with missing values.
    pub fn apply(&mut self, x: &[f64], y: &[f64]) -> PairData {
        let has_missing = x.len() != y.len() || x.iter().chain(y).any(|v| v.is_nan());
        if !has_missing {
            return PairData::new(x.to_vec(), y.to_vec());
        }

        match self.policy {
            MissingPolicy::RemovePairwise => {
                self.warn_once("missing values removed pairwise before comparison");
                let (x, y): (Vec<f64>, Vec<f64>) = x
                    .iter()
                    .zip(y)
                    .filter(|(a, b)| !a.is_nan() && !b.is_nan())
                    .map(|(&a, &b)| (a, b))
                    .unzip();
                PairData::new(x, y)
            }
            MissingPolicy::RemoveEach => {
                self.warn_once("missing values removed from each sample before comparison");
                PairData::new(drop_nan(x), drop_nan(y))
            }
            MissingPolicy::Propagate => {
                self.warn_once("missing values passed through to the statistic");
                PairData::new(x.to_vec(), y.to_vec())
            }
        }
    }

    /// Prepare two independent samples, such as two row-tag groups.
    ///
    /// Lengths may differ. [`MissingPolicy::RemovePairwise`] has no rows to
    /// pair and removes missing values from each sample.
    pub fn apply_unpaired(&mut self, x: &[f64], y: &[f64]) -> PairData {
        if !x.iter().chain(y).any(|v| v.is_nan()) {
            return PairData::new(x.to_vec(), y.to_vec());
        }

        match self.policy {
            MissingPolicy::RemovePairwise | MissingPolicy::RemoveEach => {
                self.warn_once("missing values removed from each sample before comparison");
                PairData::new(drop_nan(x), drop_nan(y))
            }
            MissingPolicy::Propagate => {
                self.warn_once("missing values passed through to the statistic");
                PairData::new(x.to_vec(), y.to_vec())
            }
        }
    }

    fn warn_once(&mut self, message: &str) {
        if !self.warned {
            warn!(policy = ?self.policy, "{message}");
            self.warned = true;
        }
    }
}

fn drop_nan(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}
