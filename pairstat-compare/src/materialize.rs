//! Named output tables of a comparison run.
//!
//! The long-format [`StatisticsTable`] has one row per comparison with the
//! columns `Reference, Compared, Statistic, PValue, Adjusted_PValue`. A
//! [`ContingencyTable`] lays one metric out as a matrix of names: only the
//! cells above the diagonal (in sorted name order) are populated, and the
//! stored table keeps just the rows used as reference and the columns used
//! as compared. A pair whose reference sorts after its compared name lands
//! below the diagonal and is masked in the stored table; the unrestricted
//! frame from [`ResultBundle::square_contingency`] still holds it, and
//! [`ContingencyTable::value`] reads a pair in either order.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;

use pairstat_core::{PairstatError, Result, Summarizable};
use serde::{Deserialize, Serialize};

use crate::family::{AdjustedResult, ResultFamily};

/// Column headers of a [`StatisticsTable`].
pub const STATISTICS_COLUMNS: [&str; 5] =
    ["Reference", "Compared", "Statistic", "PValue", "Adjusted_PValue"];

const STATISTICS_PREFIX: &str = "Statistics table - ";

/// Long-format results of one family, or of the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    name: String,
    rows: Vec<AdjustedResult>,
}

impl StatisticsTable {
    pub fn new(family: &str, rows: Vec<AdjustedResult>) -> Self {
        Self {
            name: format!("{STATISTICS_PREFIX}{family}"),
            rows,
        }
    }

    /// `"Statistics table - <family>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[AdjustedResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row comparing `reference` against `target`.
    pub fn get(&self, reference: &str, target: &str) -> Option<&AdjustedResult> {
        self.rows
            .iter()
            .find(|r| r.reference == reference && r.target == target)
    }
}

/// Which value a [`ContingencyTable`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "PValue")]
    PValue,
    #[serde(rename = "Adjusted_PValue")]
    AdjustedPValue,
    #[serde(rename = "Statistic")]
    Statistic,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::PValue, Metric::AdjustedPValue, Metric::Statistic];

    /// Column name in a [`StatisticsTable`].
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::PValue => "PValue",
            Metric::AdjustedPValue => "Adjusted_PValue",
            Metric::Statistic => "Statistic",
        }
    }

    /// Name of the contingency table of this metric.
    pub fn table_name(self) -> &'static str {
        match self {
            Metric::PValue => "Contingency table - PValue",
            Metric::AdjustedPValue => "Contingency table - Adjusted PValue",
            Metric::Statistic => "Contingency table - Statistics",
        }
    }

    pub fn value(self, row: &AdjustedResult) -> f64 {
        match self {
            Metric::PValue => row.p_value,
            Metric::AdjustedPValue => row.adjusted_p_value,
            Metric::Statistic => row.statistic,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; accepts the column name of the metric.
impl FromStr for Metric {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                PairstatError::Config(format!(
                    "unknown contingency metric '{s}' (expected PValue, Adjusted_PValue or Statistic)"
                ))
            })
    }
}

/// One metric of every comparison, as a name × name matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    metric: Metric,
    rows: Vec<String>,
    columns: Vec<String>,
    /// Row-major.
    data: Vec<f64>,
}

impl ContingencyTable {
    /// Square frame over the sorted union of all names.
    ///
    /// Cell `(reference, compared)` and its mirror take the metric value;
    /// the diagonal and everything below it is then `NaN`.
    pub fn square(results: &[AdjustedResult], metric: Metric) -> Self {
        let names: Vec<String> = results
            .iter()
            .flat_map(|r| [r.reference.as_str(), r.target.as_str()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let n = names.len();
        let mut data = vec![f64::NAN; n * n];

        for r in results {
            let (Ok(i), Ok(j)) = (
                names.binary_search_by(|s| s.as_str().cmp(r.reference.as_str())),
                names.binary_search_by(|s| s.as_str().cmp(r.target.as_str())),
            ) else {
                continue;
            };
            let v = metric.value(r);
            data[i * n + j] = v;
            data[j * n + i] = v;
        }
        for i in 0..n {
            for j in 0..=i {
                data[i * n + j] = f64::NAN;
            }
        }

        Self {
            metric,
            rows: names.clone(),
            columns: names,
            data,
        }
    }

    /// Square frame restricted to the sorted reference names (rows) and the
    /// sorted compared names (columns).
    pub fn from_results(results: &[AdjustedResult], metric: Metric) -> Self {
        let references: BTreeSet<&str> = results.iter().map(|r| r.reference.as_str()).collect();
        let compared: BTreeSet<&str> = results.iter().map(|r| r.target.as_str()).collect();
        let references: Vec<&str> = references.into_iter().collect();
        let compared: Vec<&str> = compared.into_iter().collect();
        Self::square(results, metric).restrict(&references, &compared)
    }

    /// Keep only the given rows and columns, in the given order. Names not
    /// in the table yield `NaN` cells; masked cells stay masked.
    pub fn restrict(&self, rows: &[&str], columns: &[&str]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * columns.len());
        for r in rows {
            for c in columns {
                data.push(self.get(r, c).unwrap_or(f64::NAN));
            }
        }
        Self {
            metric: self.metric,
            rows: rows.iter().map(|s| s.to_string()).collect(),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            data,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn name(&self) -> &'static str {
        self.metric.table_name()
    }

    pub fn row_names(&self) -> &[String] {
        &self.rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// (n_rows, n_columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Cell `(row, column)`; `None` if either name is absent.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.rows.iter().position(|n| n == row)?;
        let j = self.columns.iter().position(|n| n == column)?;
        Some(self.data[i * self.columns.len() + j])
    }

    /// Values of one row, in column order.
    pub fn row(&self, row: &str) -> Option<&[f64]> {
        let i = self.rows.iter().position(|n| n == row)?;
        let w = self.columns.len();
        Some(&self.data[i * w..(i + 1) * w])
    }

    /// Metric value for the pair `{a, b}`, whichever cell holds it.
    pub fn value(&self, a: &str, b: &str) -> Option<f64> {
        match (self.get(a, b), self.get(b, a)) {
            (Some(v), _) if !v.is_nan() => Some(v),
            (_, Some(v)) if !v.is_nan() => Some(v),
            (x, y) => x.or(y),
        }
    }
}

/// Every table produced by one [`compare`](crate::compare) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    label: String,
    statistic_name: String,
    full: StatisticsTable,
    families: Vec<StatisticsTable>,
    p_value: ContingencyTable,
    adjusted_p_value: ContingencyTable,
    statistic: ContingencyTable,
}

impl ResultBundle {
    /// Assemble the bundle. Per-family tables are kept only for grouped
    /// runs.
    pub fn new(
        label: &str,
        statistic_name: &str,
        families: Vec<ResultFamily>,
        grouped: bool,
    ) -> Self {
        let all: Vec<AdjustedResult> = families
            .iter()
            .flat_map(|f| f.rows.iter().cloned())
            .collect();
        let family_tables = if grouped {
            families
                .into_iter()
                .map(|f| StatisticsTable::new(&f.name, f.rows))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            label: label.to_string(),
            statistic_name: statistic_name.to_string(),
            p_value: ContingencyTable::from_results(&all, Metric::PValue),
            adjusted_p_value: ContingencyTable::from_results(&all, Metric::AdjustedPValue),
            statistic: ContingencyTable::from_results(&all, Metric::Statistic),
            full: StatisticsTable::new("Full", all),
            families: family_tables,
        }
    }

    /// Name of the test that produced the results.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label of the statistic column (e.g. `"U-Statistic"`).
    pub fn statistic_name(&self) -> &str {
        &self.statistic_name
    }

    /// `"Statistics table - Full"`: every row, families concatenated.
    pub fn full(&self) -> &StatisticsTable {
        &self.full
    }

    /// Per-family tables of a grouped run.
    pub fn families(&self) -> &[StatisticsTable] {
        &self.families
    }

    /// Table of one family, by family name (e.g. `"F_M"`).
    pub fn family(&self, name: &str) -> Option<&StatisticsTable> {
        let name = format!("{STATISTICS_PREFIX}{name}");
        self.families.iter().find(|t| t.name == name)
    }

    /// Unrestricted square frame of `metric` over every name in the run.
    pub fn square_contingency(&self, metric: Metric) -> ContingencyTable {
        ContingencyTable::square(self.full.rows(), metric)
    }

    pub fn contingency(&self, metric: Metric) -> &ContingencyTable {
        match metric {
            Metric::PValue => &self.p_value,
            Metric::AdjustedPValue => &self.adjusted_p_value,
            Metric::Statistic => &self.statistic,
        }
    }

    /// Contingency table by metric name. Unknown names are a configuration
    /// error.
    pub fn contingency_by_name(&self, metric: &str) -> Result<&ContingencyTable> {
        Ok(self.contingency(metric.parse()?))
    }

    /// Statistics table by full name.
    pub fn statistics_table(&self, name: &str) -> Option<&StatisticsTable> {
        std::iter::once(&self.full)
            .chain(&self.families)
            .find(|t| t.name == name)
    }

    /// Names of all tables, statistics tables first.
    pub fn table_names(&self) -> Vec<String> {
        std::iter::once(self.full.name.clone())
            .chain(self.families.iter().map(|t| t.name.clone()))
            .chain(Metric::ALL.iter().map(|m| m.table_name().to_string()))
            .collect()
    }

    /// Number of families corrected independently.
    pub fn n_families(&self) -> usize {
        self.families.len().max(1)
    }
}

impl Summarizable for ResultBundle {
    fn summary(&self) -> String {
        let degenerate = self.full.rows.iter().filter(|r| r.p_value.is_nan()).count();
        format!(
            "{}: {} comparisons in {} families ({} degenerate), {}",
            self.label,
            self.full.len(),
            self.n_families(),
            degenerate,
            self.statistic_name,
        )
    }
}
