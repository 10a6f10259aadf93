//! Column pre-selection by exact name or regular expression.

use regex::Regex;

use pairstat_core::{PairstatError, Result};

use crate::table::Table;

/// One pre-selection filter: an exact column name or a regex pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnFilter {
    /// Column name, or pattern when `is_regex` is set.
    pub name: String,
    /// Treat `name` as a regular expression (unanchored search).
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_regex: bool,
}

impl ColumnFilter {
    /// Filter matching exactly one column name.
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_regex: false,
        }
    }

    /// Filter matching every column whose name contains a match of `pattern`.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            name: pattern.into(),
            is_regex: true,
        }
    }

    /// Compile into a matcher. Fails on an invalid pattern.
    pub fn compile(&self) -> Result<Matcher<'_>> {
        if self.is_regex {
            let re = Regex::new(&self.name).map_err(|e| {
                PairstatError::Config(format!("invalid column pattern '{}': {e}", self.name))
            })?;
            Ok(Matcher::Pattern(re))
        } else {
            Ok(Matcher::Exact(&self.name))
        }
    }
}

/// A compiled [`ColumnFilter`].
#[derive(Debug)]
pub enum Matcher<'a> {
    Exact(&'a str),
    Pattern(Regex),
}

impl Matcher<'_> {
    pub fn matches(&self, column: &str) -> bool {
        match self {
            Matcher::Exact(name) => *name == column,
            Matcher::Pattern(re) => re.is_match(column),
        }
    }
}

impl Table {
    /// Indices of the columns matched by any of `filters`, in table order.
    ///
    /// Each column appears at most once even if several filters match it.
    /// Exact names that match no column are ignored.
    pub fn select_columns(&self, filters: &[ColumnFilter]) -> Result<Vec<usize>> {
        let matchers = filters
            .iter()
            .map(ColumnFilter::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(self
            .column_names()
            .iter()
            .enumerate()
            .filter(|(_, name)| matchers.iter().any(|m| m.matches(name)))
            .map(|(i, _)| i)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let names = ["gene_a", "gene_b", "ctrl_1", "ctrl_2", "age"];
        Table::new(
            names.iter().map(|s| s.to_string()).collect(),
            vec![vec![0.0]; names.len()],
        )
        .unwrap()
    }

    #[test]
    fn exact_names_keep_table_order() {
        let t = table();
        let idx = t
            .select_columns(&[ColumnFilter::exact("age"), ColumnFilter::exact("gene_a")])
            .unwrap();
        assert_eq!(idx, vec![0, 4]);
    }

    #[test]
    fn regex_and_exact_mixed_without_duplicates() {
        let t = table();
        let idx = t
            .select_columns(&[
                ColumnFilter::regex("^ctrl_"),
                ColumnFilter::exact("ctrl_1"),
                ColumnFilter::exact("gene_b"),
            ])
            .unwrap();
        assert_eq!(idx, vec![1, 2, 3]);
    }

    #[test]
    fn unknown_exact_name_is_ignored() {
        let t = table();
        assert!(t.select_columns(&[ColumnFilter::exact("nope")]).unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let t = table();
        let err = t.select_columns(&[ColumnFilter::regex("(")]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn regex_is_unanchored() {
        let t = table();
        assert_eq!(t.select_columns(&[ColumnFilter::regex("_")]).unwrap(), vec![0, 1, 2, 3]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn selection_is_sorted_and_distinct(
            n in 1usize..30,
            picks in proptest::collection::vec(0usize..40, 0..20),
        ) {
            let names: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
            let t = Table::new(names, vec![vec![0.0]; n]).unwrap();
            let filters: Vec<ColumnFilter> = picks
                .iter()
                .map(|p| ColumnFilter::exact(format!("c{p}")))
                .collect();
            let idx = t.select_columns(&filters).unwrap();
            prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
            for i in &idx {
                prop_assert!(*i < n && picks.contains(i));
            }
            let expected = picks.iter().filter(|&&p| p < n).collect::<std::collections::BTreeSet<_>>();
            prop_assert_eq!(idx.len(), expected.len());
        }
    }
}
