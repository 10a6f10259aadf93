//! Tabular data consumed by the pairwise comparison engine.
//!
//! - **Tables**: [`Table`] of named columns sharing a row count, with
//!   optional per-row tag maps ([`RowTags`])
//! - **Selection**: [`ColumnFilter`] for exact-name and regex pre-selection
//! - **Unfolding**: [`UnfoldedSeries`], one sub-column per row-tag value
//!
//! # Quick start
//!
//! ```
//! use pairstat_table::{ColumnFilter, Table};
//!
//! let table = Table::new(
//!     vec!["A".into(), "B".into(), "C".into()],
//!     vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
//! ).unwrap();
//!
//! let picked = table.select_columns(&[ColumnFilter::regex("^[AB]$")]).unwrap();
//! assert_eq!(picked, vec![0, 1]);
//! ```

pub mod select;
pub mod table;
pub mod unfold;

pub use select::ColumnFilter;
pub use table::{ColumnValues, RowTags, Table};
pub use unfold::UnfoldedSeries;
