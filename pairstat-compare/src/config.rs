//! Options of one comparison run.

use pairstat_core::{PairstatError, Result};
use pairstat_stats::CorrectionMethod;
use pairstat_table::ColumnFilter;
use serde::{Deserialize, Serialize};

use crate::evaluate::FailurePolicy;
use crate::missing::MissingPolicy;

/// Correction applied to each result family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustOptions {
    pub method: CorrectionMethod,
    /// Family-wise error rate, in `[0, 1]`.
    pub alpha: f64,
}

impl Default for AdjustOptions {
    fn default() -> Self {
        Self {
            method: CorrectionMethod::Bonferroni,
            alpha: 0.05,
        }
    }
}

/// Options for [`compare`](crate::compare).
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration (full pairwise over the first 500 columns, Bonferroni at
/// 0.05).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Columns to compare. Empty means the first `max_columns` columns.
    pub preselected_column_names: Vec<ColumnFilter>,
    /// Compare this column against every other selected column.
    pub reference_column: Option<String>,
    /// Unfold each column by this row tag and compare the groups.
    /// Ignored when `reference_column` is set.
    pub row_tag_key: Option<String>,
    pub adjust_pvalue: AdjustOptions,
    /// Column cap applied when no explicit pre-selection is given.
    pub max_columns: usize,
    /// Overrides the statistic's own missing-value policy.
    pub missing_values: Option<MissingPolicy>,
    /// Overrides the statistic's own failure policy.
    pub failure: Option<FailurePolicy>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            preselected_column_names: Vec::new(),
            reference_column: None,
            row_tag_key: None,
            adjust_pvalue: AdjustOptions::default(),
            max_columns: Self::DEFAULT_MAX_COLUMNS,
            missing_values: None,
            failure: None,
        }
    }
}

/// Which pairs a run enumerates, resolved from [`CompareOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode<'a> {
    FullPairwise,
    Reference(&'a str),
    RowTag(&'a str),
}

impl CompareOptions {
    pub const DEFAULT_MAX_COLUMNS: usize = 500;

    /// Parse options from TOML and validate them.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let options: Self =
            toml::from_str(toml_str).map_err(|e| PairstatError::Parse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check value ranges and compile every regex filter.
    pub fn validate(&self) -> Result<()> {
        let alpha = self.adjust_pvalue.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(PairstatError::Config(format!(
                "adjust_pvalue.alpha must be between 0 and 1, got {alpha}"
            )));
        }
        if self.max_columns == 0 {
            return Err(PairstatError::Config(
                "max_columns must be greater than 0".into(),
            ));
        }
        for filter in &self.preselected_column_names {
            filter.compile()?;
        }
        Ok(())
    }

    /// Reference column wins over row-tag key; full pairwise otherwise.
    pub fn mode(&self) -> SelectionMode<'_> {
        match (&self.reference_column, &self.row_tag_key) {
            (Some(reference), _) => SelectionMode::Reference(reference),
            (None, Some(key)) => SelectionMode::RowTag(key),
            (None, None) => SelectionMode::FullPairwise,
        }
    }

    pub fn with_columns(mut self, filters: Vec<ColumnFilter>) -> Self {
        self.preselected_column_names = filters;
        self
    }

    pub fn with_reference(mut self, column: impl Into<String>) -> Self {
        self.reference_column = Some(column.into());
        self
    }

    pub fn with_row_tag_key(mut self, key: impl Into<String>) -> Self {
        self.row_tag_key = Some(key.into());
        self
    }

    pub fn with_correction(mut self, method: CorrectionMethod, alpha: f64) -> Self {
        self.adjust_pvalue = AdjustOptions { method, alpha };
        self
    }

    pub fn with_missing_values(mut self, policy: MissingPolicy) -> Self {
        self.missing_values = Some(policy);
        self
    }

    pub fn with_failure(mut self, policy: FailurePolicy) -> Self {
        self.failure = Some(policy);
        self
    }
}
