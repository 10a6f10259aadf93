//! Ranking with tie handling for the rank-based tests.
//!
//! [`rank_average`] assigns tied values the mean of the ranks they span;
//! [`tie_groups`] reports the size of every tie group, which the
//! rank-based tests need for their variance corrections.

use core::cmp::Ordering;

/// Average ranks (1-based) of `data`.
///
/// Empty input produces empty output.
pub fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let order = sorted_order(data);
    let mut ranks = vec![0.0; n];

    let mut i = 0;
    while i < n {
        let j = tie_end(data, &order, i);
        // Ranks (i+1)..=j share their mean.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }

    ranks
}

/// Sizes of the groups of equal values in `data`, singletons excluded.
pub fn tie_groups(data: &[f64]) -> Vec<usize> {
    let order = sorted_order(data);
    let mut groups = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let j = tie_end(data, &order, i);
        if j - i > 1 {
            groups.push(j - i);
        }
        i = j;
    }
    groups
}

/// `Σ (t³ − t)` over tie groups, the common tie-correction term.
pub fn tie_term(data: &[f64]) -> f64 {
    tie_groups(data)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

fn sorted_order(data: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));
    order
}

fn tie_end(data: &[f64], order: &[usize], start: usize) -> usize {
    let mut j = start + 1;
    while j < order.len() && data[order[j]].total_cmp(&data[order[start]]) == Ordering::Equal {
        j += 1;
    }
    j
}

// ── Tests ──────────────────────────────────────────────────────────────────
