//! Partitioning of results into correction families.
//!
//! Comparisons of unfolded sub-columns are grouped by the unordered pair of
//! row-tag values they compare, taken from the group metadata each result
//! carries. Every other run forms the single family `"full"`. Correction is
//! applied to each family on its own.

use std::collections::BTreeMap;

use pairstat_core::{PairstatError, Result, Scored};
use pairstat_stats::correct;
use serde::{Deserialize, Serialize};

use crate::config::AdjustOptions;
use crate::evaluate::ComparisonResult;

/// Name of the family of ungrouped runs.
pub const FULL_FAMILY: &str = "full";

/// A [`ComparisonResult`] with its within-family adjusted p-value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedResult {
    pub reference: String,
    pub target: String,
    pub statistic: f64,
    pub p_value: f64,
    pub adjusted_p_value: f64,
}

impl Scored for AdjustedResult {
    fn score(&self) -> f64 {
        self.adjusted_p_value
    }
}

/// Results corrected together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFamily {
    /// `"<g1>_<g2>"` with the group values sorted, or `"full"`.
    pub name: String,
    pub rows: Vec<AdjustedResult>,
}

impl ResultFamily {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Unordered group pair, sorted.
fn family_key(groups: Option<&(String, String)>) -> Option<(String, String)> {
    groups.map(|(a, b)| {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    })
}

/// Partition `results` and correct each family independently.
///
/// When `grouped` is false all rows form one family. Families are returned
/// ordered by group pair; rows keep their evaluation order within a family.
pub fn correct_families(
    results: Vec<ComparisonResult>,
    grouped: bool,
    adjust: &AdjustOptions,
) -> Result<Vec<ResultFamily>> {
    if results.is_empty() {
        return Err(PairstatError::Config(
            "no comparisons were produced (empty result set)".into(),
        ));
    }

    let mut partitions: BTreeMap<Option<(String, String)>, Vec<ComparisonResult>> =
        BTreeMap::new();
    for result in results {
        let key = if grouped {
            family_key(result.groups.as_ref())
        } else {
            None
        };
        partitions.entry(key).or_default().push(result);
    }

    let mut named: BTreeMap<String, &(String, String)> = BTreeMap::new();
    for key in partitions.keys().flatten() {
        let name = family_name(key);
        if let Some(other) = named.insert(name.clone(), key) {
            return Err(PairstatError::Config(format!(
                "row tag groups ('{}', '{}') and ('{}', '{}') both map to family '{name}'",
                other.0, other.1, key.0, key.1
            )));
        }
    }

    partitions
        .into_iter()
        .map(|(key, rows)| {
            let name = key
                .as_ref()
                .map_or_else(|| FULL_FAMILY.to_string(), family_name);
            correct_family(name, rows, adjust)
        })
        .collect()
}

fn family_name((a, b): &(String, String)) -> String {
    format!("{a}_{b}")
}

fn correct_family(
    name: String,
    rows: Vec<ComparisonResult>,
    adjust: &AdjustOptions,
) -> Result<ResultFamily> {
    let p_values: Vec<f64> = rows.iter().map(|r| r.p_value).collect();
    let adjusted = correct(&p_values, adjust.method, adjust.alpha)?;

    let rows = rows
        .into_iter()
        .zip(adjusted)
        .map(|(r, adjusted_p_value)| AdjustedResult {
            reference: r.reference,
            target: r.target,
            statistic: r.statistic,
            p_value: r.p_value,
            adjusted_p_value,
        })
        .collect();
    Ok(ResultFamily { name, rows })
}
