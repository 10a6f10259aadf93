//! Tail probabilities for the reference distributions of the tests.
//!
//! Thin wrappers over `statrs` that turn a test statistic into a p-value
//! for a given [`Alternative`].

use core::str::FromStr;

use pairstat_core::{PairstatError, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Alternative hypothesis of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Alternative {
    /// The location of the first sample differs from the second.
    #[default]
    TwoSided,
    /// The first sample is stochastically smaller.
    Less,
    /// The first sample is stochastically greater.
    Greater,
}

impl FromStr for Alternative {
    type Err = PairstatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "two-sided" | "two_sided" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            other => Err(PairstatError::Config(format!(
                "unknown alternative hypothesis '{other}' (expected two-sided, less or greater)"
            ))),
        }
    }
}

fn distribution_error(name: &str, e: impl core::fmt::Display) -> PairstatError {
    PairstatError::InvalidInput(format!("{name}: {e}"))
}

/// p-value of a Student-t statistic with `df` degrees of freedom.
pub fn t_p_value(t: f64, df: f64, alternative: Alternative) -> Result<f64> {
    if t.is_nan() {
        return Err(PairstatError::InvalidInput("t statistic is NaN".into()));
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| distribution_error("StudentsT", e))?;
    let p = match alternative {
        Alternative::TwoSided => 2.0 * dist.sf(t.abs()),
        Alternative::Less => dist.cdf(t),
        Alternative::Greater => dist.sf(t),
    };
    Ok(p.clamp(0.0, 1.0))
}

/// p-value of a standard-normal statistic.
pub fn z_p_value(z: f64, alternative: Alternative) -> Result<f64> {
    if z.is_nan() {
        return Err(PairstatError::InvalidInput("z statistic is NaN".into()));
    }
    let dist = Normal::new(0.0, 1.0).map_err(|e| distribution_error("Normal", e))?;
    let p = match alternative {
        Alternative::TwoSided => 2.0 * dist.sf(z.abs()),
        Alternative::Less => dist.cdf(z),
        Alternative::Greater => dist.sf(z),
    };
    Ok(p.clamp(0.0, 1.0))
}

/// Upper tail `P(X >= x)` of the standard normal.
pub fn normal_sf(z: f64) -> Result<f64> {
    z_p_value(z, Alternative::Greater)
}

/// Upper tail of the χ² distribution with `df` degrees of freedom.
pub fn chi_squared_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df).map_err(|e| distribution_error("ChiSquared", e))?;
    Ok(dist.sf(x).clamp(0.0, 1.0))
}

/// Upper tail of the F distribution with `(d1, d2)` degrees of freedom.
pub fn f_sf(f: f64, d1: f64, d2: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(d1, d2).map_err(|e| distribution_error("FisherSnedecor", e))?;
    Ok(dist.sf(f).clamp(0.0, 1.0))
}
