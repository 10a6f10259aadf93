//! Pairwise statistical comparison of table columns.
//!
//! [`compare`] runs one [`PairwiseStatistic`] over column pairs of a
//! [`Table`], corrects the p-values per family and returns every result
//! table in a [`ResultBundle`]:
//!
//! - **Enumeration**: full pairwise, against a reference column, or between
//!   row-tag groups ([`enumerate`])
//! - **Evaluation**: missing-value policy and per-pair failure handling
//!   ([`missing`], [`evaluate`])
//! - **Correction**: one family per group pair, or a single `"full"`
//!   family ([`family`])
//! - **Output**: statistics and contingency tables ([`materialize`])
//!
//! # Quick start
//!
//! ```
//! use pairstat_compare::{compare, CompareOptions, Metric};
//! use pairstat_compare::statistic::TTestInd;
//! use pairstat_table::Table;
//!
//! let table = Table::new(
//!     vec!["A".into(), "B".into(), "C".into()],
//!     vec![
//!         vec![1.0, 2.0, 3.0, 4.0],
//!         vec![5.0, 6.0, 7.0, 8.0],
//!         vec![3.0, 8.0, 5.0, 4.0],
//!     ],
//! ).unwrap();
//!
//! let bundle = compare(&table, &CompareOptions::default(), &TTestInd::default()).unwrap();
//! assert_eq!(bundle.full().len(), 3);
//! assert!(bundle.contingency(Metric::PValue).value("A", "B").is_some());
//! ```

pub mod config;
pub mod enumerate;
pub mod evaluate;
pub mod family;
pub mod materialize;
pub mod missing;
pub mod statistic;

pub use config::{AdjustOptions, CompareOptions, SelectionMode};
pub use evaluate::{ComparisonResult, FailurePolicy, PairwiseStatistic};
pub use family::{AdjustedResult, ResultFamily};
pub use materialize::{ContingencyTable, Metric, ResultBundle, StatisticsTable};
pub use missing::{MissingPolicy, PairData};

use pairstat_core::Result;
use pairstat_table::Table;
use tracing::info;

use crate::enumerate::ComparisonPlan;
use crate::evaluate::Evaluator;
use crate::family::correct_families;

/// Compare column pairs of `table` with `statistic`.
///
/// Configuration errors abort the run. Degenerate comparisons show up as
/// `NaN` rows unless the failure policy is strict.
pub fn compare<S>(table: &Table, options: &CompareOptions, statistic: &S) -> Result<ResultBundle>
where
    S: PairwiseStatistic + ?Sized,
{
    options.validate()?;
    let plan = ComparisonPlan::new(table, options)?;
    info!(
        mode = plan.mode_name(),
        columns = plan.columns().len(),
        test = statistic.label(),
        "starting pairwise comparison"
    );

    let mut evaluator = Evaluator::new(statistic, options);
    for block in plan.blocks() {
        let block = block?;
        evaluator.reserve(block.n_pairs());
        for pair in block.pairs() {
            evaluator.evaluate(&pair)?;
        }
    }
    let results = evaluator.finish();
    let n_comparisons = results.len();

    let families = correct_families(results, plan.is_grouped(), &options.adjust_pvalue)?;
    info!(
        comparisons = n_comparisons,
        families = families.len(),
        method = %options.adjust_pvalue.method,
        "pairwise comparison finished"
    );

    Ok(ResultBundle::new(
        statistic.label(),
        statistic.statistic_name(),
        families,
        plan.is_grouped(),
    ))
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pairstat_core::{PairstatError, Summarizable};
    use pairstat_stats::CorrectionMethod;
    use pairstat_table::{ColumnFilter, ColumnValues, RowTags};

    use crate::statistic::{Anova, MannWhitney, Pearson, TTestInd};

    fn abc() -> Table {
        Table::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![5.0, 6.0, 7.0, 8.0],
                vec![3.0, 8.0, 5.0, 4.0],
            ],
        )
        .unwrap()
    }

    fn mean_difference(d: &PairData, _: &str, _: &str) -> Result<(f64, f64)> {
        let mx = d.x.iter().sum::<f64>() / d.x.len() as f64;
        let my = d.y.iter().sum::<f64>() / d.y.len() as f64;
        Ok((mx - my, (mx - my).abs().min(10.0) / 10.0))
    }

    fn tags(key: &str, values: &[&str]) -> Vec<RowTags> {
        values
            .iter()
            .map(|v| RowTags::from([(key.to_string(), v.to_string())]))
            .collect()
    }

    #[test]
    fn full_pairwise_abc() {
        let b = compare(&abc(), &CompareOptions::default(), &mean_difference).unwrap();
        let pairs: Vec<(&str, &str)> = b
            .full()
            .rows()
            .iter()
            .map(|r| (r.reference.as_str(), r.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("A", "C"), ("B", "C")]);
        assert_eq!(b.full().rows()[0].statistic, -4.0);

        let square = ContingencyTable::square(b.full().rows(), Metric::PValue);
        assert_eq!(square.shape(), (3, 3));
        assert!(!square.get("A", "B").unwrap().is_nan());
        assert!(!square.get("A", "C").unwrap().is_nan());
        assert!(!square.get("B", "C").unwrap().is_nan());
        for (r, c) in [("A", "A"), ("B", "A"), ("C", "A"), ("C", "B"), ("C", "C")] {
            assert!(square.get(r, c).unwrap().is_nan());
        }
        assert_eq!(b.contingency(Metric::PValue).shape(), (2, 2));
    }

    #[test]
    fn bonferroni_over_three_pairs() {
        let b = compare(&abc(), &CompareOptions::default(), &mean_difference).unwrap();
        for r in b.full().rows() {
            assert!((r.adjusted_p_value - (r.p_value * 3.0).min(1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn row_tag_single_family() {
        let t = Table::new(vec!["A".into()], vec![vec![1.0, 2.0, 3.0, 4.0]])
            .unwrap()
            .with_row_tags(tags("Gender", &["M", "F", "F", "M"]))
            .unwrap();
        let opts = CompareOptions::default().with_row_tag_key("Gender");
        let b = compare(&t, &opts, &mean_difference).unwrap();
        assert_eq!(b.families().len(), 1);
        let fam = b.family("F_M").unwrap();
        assert_eq!(fam.len(), 1);
        assert_eq!(fam.rows()[0].reference, "F_A");
        assert_eq!(fam.rows()[0].target, "M_A");
        assert!(b
            .table_names()
            .contains(&"Statistics table - F_M".to_string()));
    }

    #[test]
    fn row_tag_families_are_independent() {
        let t = Table::new(
            vec!["A".into(), "B".into()],
            vec![
                vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
            ],
        )
        .unwrap()
        .with_row_tags(tags("Group", &["M", "F", "X", "M", "F", "X"]))
        .unwrap();
        let opts = CompareOptions::default().with_row_tag_key("Group");
        let b = compare(&t, &opts, &mean_difference).unwrap();

        let names: Vec<&str> = b.families().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "Statistics table - F_M",
                "Statistics table - F_X",
                "Statistics table - M_X",
            ]
        );
        // Two original columns per family; Bonferroni over 2, not 6.
        for fam in b.families() {
            assert_eq!(fam.len(), 2);
            for r in fam.rows() {
                assert!((r.adjusted_p_value - (r.p_value * 2.0).min(1.0)).abs() < 1e-12);
            }
        }
        assert_eq!(b.full().len(), 6);
    }

    #[test]
    fn uneven_groups_use_every_observation() {
        let t = Table::new(vec!["A".into()], vec![vec![1.0, 2.0, 3.0, 4.0]])
            .unwrap()
            .with_row_tags(tags("Gender", &["M", "F", "F", "F"]))
            .unwrap();
        let opts = CompareOptions::default().with_row_tag_key("Gender");
        let b = compare(&t, &opts, &mean_difference).unwrap();
        let r = b.full().get("F_A", "M_A").unwrap();
        assert_eq!(r.statistic, 2.0);

        let paired = compare(&t, &opts, &Pearson).unwrap();
        assert!(paired.full().rows()[0].p_value.is_nan());
    }

    #[test]
    fn all_nan_pair_does_not_abort() {
        let nan = f64::NAN;
        let t = Table::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![1.0, nan, 3.0, nan],
                vec![nan, 6.0, nan, 8.0],
                vec![3.0, 8.0, 5.0, 4.0],
            ],
        )
        .unwrap();
        let b = compare(&t, &CompareOptions::default(), &Pearson).unwrap();
        let ab = b.full().get("A", "B").unwrap();
        assert!(ab.statistic.is_nan());
        assert!(ab.p_value.is_nan());
        assert!(ab.adjusted_p_value.is_nan());

        let bc = b.full().get("B", "C").unwrap();
        assert!(!bc.p_value.is_nan());
        // Only the two defined p-values count toward the family size.
        assert!((bc.adjusted_p_value - (bc.p_value * 2.0).min(1.0)).abs() < 1e-12);
    }

    #[test]
    fn text_columns_are_coerced() {
        let t = Table::from_columns(
            vec!["x".into(), "y".into()],
            vec![
                ColumnValues::Text(vec!["1".into(), "2".into(), "oops".into(), "4".into()]),
                ColumnValues::Numeric(vec![2.0, 4.0, 6.0, 8.5]),
            ],
        )
        .unwrap();
        let b = compare(&t, &CompareOptions::default(), &Pearson).unwrap();
        let r = &b.full().rows()[0];
        assert!(r.statistic > 0.99);
    }

    #[test]
    fn reference_mode_rectangular_contingency() {
        let opts = CompareOptions::default().with_reference("B");
        let b = compare(&abc(), &opts, &mean_difference).unwrap();
        assert!(b.full().rows().iter().all(|r| r.reference == "B"));
        let c = b.contingency(Metric::Statistic);
        assert_eq!(c.shape(), (1, 2));
        assert!(c.get("B", "A").unwrap().is_nan());
        assert_eq!(c.get("B", "C"), Some(1.5));

        let square = b.square_contingency(Metric::Statistic);
        assert_eq!(square.get("A", "B"), Some(4.0));
        assert!(square.get("B", "A").unwrap().is_nan());
        assert_eq!(square.value("B", "A"), Some(4.0));
    }

    #[test]
    fn regex_preselection() {
        let t = Table::new(
            vec!["gene_a".into(), "gene_b".into(), "age".into()],
            vec![vec![1.0, 2.0], vec![3.0, 5.0], vec![9.0, 9.0]],
        )
        .unwrap();
        let opts = CompareOptions::default().with_columns(vec![ColumnFilter::regex("^gene_")]);
        let b = compare(&t, &opts, &mean_difference).unwrap();
        assert_eq!(b.full().len(), 1);
        assert_eq!(b.full().rows()[0].target, "gene_b");
    }

    #[test]
    fn configuration_errors() {
        let t = abc();
        let missing_ref = CompareOptions::default().with_reference("Z");
        assert!(compare(&t, &missing_ref, &mean_difference)
            .unwrap_err()
            .is_config());

        let one = CompareOptions::default().with_columns(vec![ColumnFilter::exact("A")]);
        assert!(compare(&t, &one, &mean_difference).unwrap_err().is_config());

        let alpha = CompareOptions::default().with_correction(CorrectionMethod::Holm, -0.1);
        assert!(compare(&t, &alpha, &mean_difference).unwrap_err().is_config());
    }

    #[test]
    fn untestable_groups_are_empty_result_set() {
        // One group per column: no pairs at all.
        let t = abc().with_row_tags(tags("Site", &["x", "x", "x", "x"])).unwrap();
        let opts = CompareOptions::default().with_row_tag_key("Site");
        let err = compare(&t, &opts, &mean_difference).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("empty result set"));
    }

    #[test]
    fn strict_statistic_aborts_batch() {
        let t = Table::new(
            vec!["A".into(), "B".into()],
            vec![vec![2.0, 2.0, 2.0], vec![2.0, 2.0, 2.0]],
        )
        .unwrap();
        let err = compare(&t, &CompareOptions::default(), &Anova).unwrap_err();
        assert!(matches!(err, PairstatError::Statistic { .. }));

        let lenient = CompareOptions::default().with_failure(FailurePolicy::Lenient);
        let b = compare(&t, &lenient, &Anova).unwrap();
        assert!(b.full().rows()[0].p_value.is_nan());
    }

    #[test]
    fn labels_and_summary() {
        let b = compare(&abc(), &CompareOptions::default(), &MannWhitney::default()).unwrap();
        assert_eq!(b.statistic_name(), "U-Statistic");
        assert_eq!(b.label(), "Mann-Whitney");
        assert!(b.summary().starts_with("Mann-Whitney: 3 comparisons in 1 families"));

        let t = TTestInd::default();
        let dynamic: &dyn PairwiseStatistic = &t;
        let b = compare(&abc(), &CompareOptions::default(), dynamic).unwrap();
        assert_eq!(b.statistic_name(), "T-Statistic");
    }

    #[test]
    fn monotone_methods_never_lower_p() {
        for method in [
            CorrectionMethod::Bonferroni,
            CorrectionMethod::Holm,
            CorrectionMethod::BenjaminiHochberg,
        ] {
            let opts = CompareOptions::default().with_correction(method, 0.05);
            let b = compare(&abc(), &opts, &TTestInd::default()).unwrap();
            for r in b.full().rows() {
                assert!(r.adjusted_p_value >= r.p_value);
            }
        }
    }
}
