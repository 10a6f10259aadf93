//! Statistical methods behind pairwise comparisons.
//!
//! - **Hypothesis testing**: t-tests, Mann-Whitney U, Wilcoxon signed-rank,
//!   one-way ANOVA, Kruskal-Wallis ([`testing`])
//! - **Correlation**: Pearson and Spearman with p-values ([`correlation`])
//! - **Multiple testing correction**: Bonferroni, Šidák, Holm, Holm-Šidák,
//!   Simes-Hochberg, Hommel, Benjamini-Hochberg/Yekutieli and the two-stage
//!   FDR procedures ([`correction`])
//! - **Distributions**: tail probabilities for t, normal, F and χ² ([`distribution`])

pub mod correction;
pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod rank;
pub mod testing;

pub use correction::{correct, CorrectionMethod};
pub use distribution::Alternative;
pub use testing::{MannWhitneyMethod, TestResult, WilcoxonMode, ZeroMethod};
