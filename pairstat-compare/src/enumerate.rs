//! Enumeration of the column pairs to compare.
//!
//! A [`ComparisonPlan`] resolves the selection options against a table once
//! and then hands out [`ComparisonBlock`]s: one block of borrowed columns in
//! full-pairwise and reference mode, or one block of unfolded sub-columns
//! per original column in row-tag mode. Pairs within a block are produced
//! lazily by [`PairIndices`], so the cross-product of columns is never
//! materialized.

use std::borrow::Cow;

use pairstat_core::{PairstatError, Result};
use pairstat_table::Table;

use crate::config::{CompareOptions, SelectionMode};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanMode {
    FullPairwise,
    Reference(usize),
    RowTag(String),
}

/// Selection options resolved against one table.
#[derive(Debug)]
pub struct ComparisonPlan<'t> {
    table: &'t Table,
    mode: PlanMode,
    columns: Vec<usize>,
    max_columns: usize,
}

impl<'t> ComparisonPlan<'t> {
    /// Resolve `options` against `table`.
    ///
    /// Fails with a configuration error when the reference column does not
    /// exist, when too few columns are selected, or when the row-tag key
    /// appears on no row.
    pub fn new(table: &'t Table, options: &CompareOptions) -> Result<Self> {
        let mut columns = if options.preselected_column_names.is_empty() {
            (0..table.n_columns().min(options.max_columns)).collect()
        } else {
            table.select_columns(&options.preselected_column_names)?
        };

        let mode = match options.mode() {
            SelectionMode::FullPairwise => {
                if columns.len() <= 1 {
                    return Err(not_enough_columns(columns.len()));
                }
                PlanMode::FullPairwise
            }
            SelectionMode::Reference(name) => {
                let reference = table.column_index(name).ok_or_else(|| {
                    PairstatError::Config(format!(
                        "reference column '{name}' not found in the table"
                    ))
                })?;
                if let Err(pos) = columns.binary_search(&reference) {
                    columns.insert(pos, reference);
                }
                if columns.len() <= 1 {
                    return Err(not_enough_columns(columns.len()));
                }
                PlanMode::Reference(reference)
            }
            SelectionMode::RowTag(key) => {
                if table.row_tags().is_none() {
                    return Err(PairstatError::Config(format!(
                        "cannot group by row tag '{key}': the table has no row tags"
                    )));
                }
                if table.tag_values(key).is_empty() {
                    return Err(PairstatError::Config(format!(
                        "row tag '{key}' not found on any row"
                    )));
                }
                if columns.is_empty() {
                    return Err(not_enough_columns(0));
                }
                PlanMode::RowTag(key.to_string())
            }
        };

        Ok(Self {
            table,
            mode,
            columns,
            max_columns: options.max_columns,
        })
    }

    /// Selected column indices, in table order.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Whether pairs carry group metadata (row-tag mode).
    pub fn is_grouped(&self) -> bool {
        matches!(self.mode, PlanMode::RowTag(_))
    }

    /// Short mode name for logging.
    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            PlanMode::FullPairwise => "full-pairwise",
            PlanMode::Reference(_) => "reference",
            PlanMode::RowTag(_) => "row-tag",
        }
    }

    /// Number of blocks [`blocks`](Self::blocks) yields.
    pub fn n_blocks(&self) -> usize {
        match self.mode {
            PlanMode::RowTag(_) => self.columns.len(),
            _ => 1,
        }
    }

    /// Comparison blocks in deterministic order. Row-tag blocks are
    /// unfolded one at a time as the iterator advances.
    pub fn blocks(&self) -> impl Iterator<Item = Result<ComparisonBlock<'t>>> + '_ {
        (0..self.n_blocks()).map(move |b| self.block(b))
    }

    fn block(&self, b: usize) -> Result<ComparisonBlock<'t>> {
        match &self.mode {
            PlanMode::FullPairwise => {
                let series = self.columns.iter().map(|&c| self.borrowed(c)).collect();
                Ok(ComparisonBlock::new(series, PairLayout::Full))
            }
            PlanMode::Reference(reference) => {
                let series = std::iter::once(*reference)
                    .chain(self.columns.iter().copied().filter(|c| c != reference))
                    .map(|c| self.borrowed(c))
                    .collect();
                Ok(ComparisonBlock::new(series, PairLayout::Reference(0)))
            }
            PlanMode::RowTag(key) => {
                let series = self
                    .table
                    .unfold_by_tag(self.columns[b], key)?
                    .into_iter()
                    .take(self.max_columns)
                    .map(|mut s| {
                        s.values.truncate(s.observations);
                        Series {
                            name: Cow::Owned(s.name),
                            group: Some(s.group),
                            values: Cow::Owned(s.values),
                        }
                    })
                    .collect();
                Ok(ComparisonBlock::new(series, PairLayout::Full))
            }
        }
    }

    fn borrowed(&self, column: usize) -> Series<'t> {
        Series {
            name: Cow::Borrowed(self.table.column_name(column).unwrap_or_default()),
            group: None,
            values: Cow::Borrowed(self.table.numeric(column).unwrap_or_default()),
        }
    }
}

fn not_enough_columns(found: usize) -> PairstatError {
    PairstatError::Config(format!(
        "not enough columns to compare ({found} selected)"
    ))
}

/// One named numeric series taking part in comparisons.
#[derive(Debug, Clone)]
pub struct Series<'t> {
    pub name: Cow<'t, str>,
    /// Row-tag value, for unfolded sub-columns.
    pub group: Option<String>,
    pub values: Cow<'t, [f64]>,
}

/// How the series of a block are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairLayout {
    /// Every `i < j` exactly once.
    Full,
    /// Series `r` against every other series.
    Reference(usize),
}

/// A set of series and the pairs to compare among them.
#[derive(Debug, Clone)]
pub struct ComparisonBlock<'t> {
    series: Vec<Series<'t>>,
    layout: PairLayout,
}

impl<'t> ComparisonBlock<'t> {
    pub fn new(series: Vec<Series<'t>>, layout: PairLayout) -> Self {
        Self { series, layout }
    }

    pub fn series(&self) -> &[Series<'t>] {
        &self.series
    }

    pub fn layout(&self) -> PairLayout {
        self.layout
    }

    /// Index pairs, lazily.
    pub fn pair_indices(&self) -> PairIndices {
        PairIndices::new(self.series.len(), self.layout)
    }

    /// Number of pairs in this block.
    pub fn n_pairs(&self) -> usize {
        self.pair_indices().len()
    }

    /// The pairs of this block, borrowing the series data.
    pub fn pairs(&self) -> impl Iterator<Item = ComparisonPair<'_>> + '_ {
        self.pair_indices().map(move |(i, j)| self.pair(i, j))
    }

    fn pair(&self, i: usize, j: usize) -> ComparisonPair<'_> {
        let (a, b) = (&self.series[i], &self.series[j]);
        ComparisonPair {
            reference: &a.name,
            target: &b.name,
            x: &a.values,
            y: &b.values,
            groups: a.group.as_deref().zip(b.group.as_deref()),
        }
    }
}

/// One comparison: two named series and their values.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonPair<'b> {
    pub reference: &'b str,
    pub target: &'b str,
    pub x: &'b [f64],
    pub y: &'b [f64],
    /// Group values of the two sides, in row-tag mode.
    pub groups: Option<(&'b str, &'b str)>,
}

impl ComparisonPair<'_> {
    /// Whether row `i` of `x` and row `i` of `y` come from the same table
    /// row. Sides drawn from different row-tag groups are not.
    pub fn is_paired(&self) -> bool {
        self.groups.is_none()
    }
}

/// Iterator over the `(reference, target)` index pairs of a block.
#[derive(Debug, Clone)]
pub struct PairIndices {
    n: usize,
    layout: PairLayout,
    i: usize,
    j: usize,
}

impl PairIndices {
    pub fn new(n: usize, layout: PairLayout) -> Self {
        let (i, j) = match layout {
            PairLayout::Full => (0, 1),
            PairLayout::Reference(r) => (r, usize::from(r == 0)),
        };
        Self { n, layout, i, j }
    }
}

impl Iterator for PairIndices {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        match self.layout {
            PairLayout::Full => {
                if self.j >= self.n {
                    self.i += 1;
                    self.j = self.i + 1;
                    if self.j >= self.n {
                        return None;
                    }
                }
                let pair = (self.i, self.j);
                self.j += 1;
                Some(pair)
            }
            PairLayout::Reference(r) => {
                if r >= self.n || self.j >= self.n {
                    return None;
                }
                let pair = (r, self.j);
                self.j += 1;
                if self.j == r {
                    self.j += 1;
                }
                Some(pair)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.layout {
            PairLayout::Full => {
                if self.i >= self.n {
                    0
                } else {
                    let in_row = self.n.saturating_sub(self.j);
                    let rest = self.n - self.i - 1;
                    let later_rows = rest * rest.saturating_sub(1) / 2;
                    in_row + later_rows
                }
            }
            PairLayout::Reference(r) => {
                if r >= self.n {
                    0
                } else {
                    let left = self.n.saturating_sub(self.j);
                    left - usize::from(self.j < r)
                }
            }
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PairIndices {}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn full_pairwise_enumerates_each_unordered_pair_once(n in 0usize..40) {
            let pairs: Vec<_> = PairIndices::new(n, PairLayout::Full).collect();
            prop_assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
            let unique: HashSet<_> = pairs.iter().map(|&(i, j)| (i.min(j), i.max(j))).collect();
            prop_assert_eq!(unique.len(), pairs.len());
            prop_assert!(pairs.iter().all(|&(i, j)| i < j));
        }

        #[test]
        fn reference_enumerates_k_minus_one(n in 1usize..40, r in 0usize..40) {
            let r = r % n;
            let pairs: Vec<_> = PairIndices::new(n, PairLayout::Reference(r)).collect();
            prop_assert_eq!(pairs.len(), n - 1);
            prop_assert!(pairs.iter().all(|&(a, b)| a == r && b != r));
        }

        #[test]
        fn size_hint_tracks_progress(n in 0usize..20, skip in 0usize..200) {
            let mut it = PairIndices::new(n, PairLayout::Full);
            let total = it.len();
            for _ in 0..skip.min(total) {
                it.next();
            }
            prop_assert_eq!(it.len(), total - skip.min(total));
        }

        #[test]
        fn row_tag_pairs_per_column(groups in 1usize..6, columns in 1usize..4) {
            let rows = groups * 2;
            let names: Vec<String> = (0..columns).map(|c| format!("c{c}")).collect();
            let data: Vec<Vec<f64>> = (0..columns)
                .map(|c| (0..rows).map(|r| (r + c) as f64).collect())
                .collect();
            let tags = (0..rows)
                .map(|r| pairstat_table::RowTags::from([("g".to_string(), format!("{}", r % groups))]))
                .collect();
            let t = Table::new(names, data).unwrap().with_row_tags(tags).unwrap();
            let opts = CompareOptions::default().with_row_tag_key("g");
            let plan = ComparisonPlan::new(&t, &opts).unwrap();
            for block in plan.blocks() {
                prop_assert_eq!(block.unwrap().n_pairs(), groups * (groups - 1) / 2);
            }
        }
    }
}
