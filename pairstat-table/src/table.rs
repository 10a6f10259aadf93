//! Named-column table with optional row tags.
//!
//! [`Table`] stores an ordered list of columns that share a row count. A
//! column is either numeric or text ([`ColumnValues`]); text cells are
//! coerced to `f64` on demand, with unparseable cells becoming `NaN`. The
//! coerced matrix is computed once and cached for the lifetime of the table.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use pairstat_core::{PairstatError, Result, Summarizable};

/// Tag-key → tag-value metadata attached to one row.
pub type RowTags = BTreeMap<String, String>;

/// Raw values of one column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnValues {
    /// Numeric values; `NaN` marks a missing cell.
    Numeric(Vec<f64>),
    /// Free-text cells, coerced to numeric when compared.
    Text(Vec<String>),
}

impl ColumnValues {
    /// Number of cells in this column.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coerce to numeric. Text that does not parse as a number becomes `NaN`.
    pub fn to_numeric(&self) -> Vec<f64> {
        match self {
            ColumnValues::Numeric(v) => v.clone(),
            ColumnValues::Text(v) => v.iter().map(|s| coerce_cell(s)).collect(),
        }
    }
}

fn coerce_cell(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// A table of named columns sharing a row count.
#[derive(Debug, Clone)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<ColumnValues>,
    n_rows: usize,
    row_tags: Option<Vec<RowTags>>,
    numeric: OnceLock<Vec<Vec<f64>>>,
}

impl Table {
    /// Create a numeric table. Each inner `Vec` is one column.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_columns(
            names,
            columns.into_iter().map(ColumnValues::Numeric).collect(),
        )
    }

    /// Create a table from raw column values of any kind.
    ///
    /// Column names must be unique and all columns must have the same length.
    pub fn from_columns(names: Vec<String>, columns: Vec<ColumnValues>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(PairstatError::InvalidInput(format!(
                "Table: {} names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let n_rows = columns.first().map_or(0, ColumnValues::len);
        for (name, col) in names.iter().zip(&columns) {
            if col.len() != n_rows {
                return Err(PairstatError::InvalidInput(format!(
                    "Table: column '{name}' has {} rows, expected {n_rows}",
                    col.len()
                )));
            }
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(PairstatError::InvalidInput(format!(
                    "Table: duplicate column name '{name}'"
                )));
            }
        }

        Ok(Self {
            names,
            columns,
            n_rows,
            row_tags: None,
            numeric: OnceLock::new(),
        })
    }

    /// Attach one tag map per row.
    pub fn with_row_tags(mut self, tags: Vec<RowTags>) -> Result<Self> {
        if tags.len() != self.n_rows {
            return Err(PairstatError::InvalidInput(format!(
                "Table: {} row tag maps for {} rows",
                tags.len(),
                self.n_rows
            )));
        }
        self.row_tags = Some(tags);
        Ok(self)
    }

    /// (n_rows, n_columns).
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.names.len())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Name of the column at `idx`.
    pub fn column_name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// Index of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Raw values of the column at `idx`.
    pub fn values(&self, idx: usize) -> Option<&ColumnValues> {
        self.columns.get(idx)
    }

    /// Numeric view of the column at `idx` (coerced, cached).
    pub fn numeric(&self, idx: usize) -> Option<&[f64]> {
        self.numeric_matrix().get(idx).map(Vec::as_slice)
    }

    /// Numeric view of the column called `name`.
    pub fn numeric_by_name(&self, name: &str) -> Option<&[f64]> {
        self.numeric(self.column_index(name)?)
    }

    /// All columns coerced to numeric. Computed on first use.
    pub fn numeric_matrix(&self) -> &[Vec<f64>] {
        self.numeric
            .get_or_init(|| self.columns.iter().map(ColumnValues::to_numeric).collect())
    }

    /// Row tag maps, if the table carries any.
    pub fn row_tags(&self) -> Option<&[RowTags]> {
        self.row_tags.as_deref()
    }

    /// Value of tag `key` on row `row`.
    pub fn row_tag(&self, row: usize, key: &str) -> Option<&str> {
        self.row_tags
            .as_ref()?
            .get(row)?
            .get(key)
            .map(String::as_str)
    }

    /// Distinct values of tag `key` across all rows, sorted.
    pub fn tag_values(&self, key: &str) -> Vec<&str> {
        let mut values: Vec<&str> = (0..self.n_rows)
            .filter_map(|row| self.row_tag(row, key))
            .collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

impl Summarizable for Table {
    fn summary(&self) -> String {
        format!(
            "Table: {} rows \u{00d7} {} columns",
            self.n_rows,
            self.names.len()
        )
    }
}
