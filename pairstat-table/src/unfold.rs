//! Unfolding a column into one sub-column per row-tag value.
//!
//! Given a tag key such as `Gender`, the values of a column are split by the
//! tag value of each row: rows tagged `M` form the `M_<column>` sub-column,
//! rows tagged `F` form `F_<column>`, and so on. Rows that do not carry the
//! key are skipped. The tag value and the source column travel with each
//! sub-column, so consumers never need to parse them back out of the name.

use std::collections::BTreeMap;

use pairstat_core::{PairstatError, Result};

use crate::table::Table;

/// One sub-column produced by [`Table::unfold_by_tag`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnfoldedSeries {
    /// Display name, `<group>_<source>`.
    pub name: String,
    /// Name of the column the values were drawn from.
    pub source: String,
    /// Tag value shared by every row of this sub-column.
    pub group: String,
    /// Values of the rows carrying `group`, padded with `NaN` so that all
    /// sub-columns of one unfolding have the same length.
    pub values: Vec<f64>,
    /// Number of rows carrying `group`; `values[observations..]` is padding.
    pub observations: usize,
}

impl UnfoldedSeries {
    /// Values of the rows carrying `group`, without padding.
    pub fn observed(&self) -> &[f64] {
        &self.values[..self.observations.min(self.values.len())]
    }
}

impl Table {
    /// Split column `idx` by the value of tag `key` on each row.
    ///
    /// Returns one [`UnfoldedSeries`] per distinct tag value, sorted by tag
    /// value. Within a group, rows keep their table order.
    pub fn unfold_by_tag(&self, idx: usize, key: &str) -> Result<Vec<UnfoldedSeries>> {
        let source = self.column_name(idx).ok_or_else(|| {
            PairstatError::InvalidInput(format!(
                "unfold_by_tag: column index {idx} out of bounds (n_columns={})",
                self.n_columns()
            ))
        })?;
        if self.row_tags().is_none() {
            return Err(PairstatError::Config(format!(
                "cannot group by row tag '{key}': the table has no row tags"
            )));
        }
        let values = self.numeric(idx).unwrap_or(&[]);

        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (row, &v) in values.iter().enumerate() {
            if let Some(group) = self.row_tag(row, key) {
                groups.entry(group).or_default().push(v);
            }
        }

        let width = groups.values().map(Vec::len).max().unwrap_or(0);
        Ok(groups
            .into_iter()
            .map(|(group, mut values)| {
                let observations = values.len();
                values.resize(width, f64::NAN);
                UnfoldedSeries {
                    name: format!("{group}_{source}"),
                    source: source.to_string(),
                    group: group.to_string(),
                    values,
                    observations,
                }
            })
            .collect())
    }
}
