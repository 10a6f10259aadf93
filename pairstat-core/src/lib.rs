//! Shared primitives for the pairstat crates.
//!
//! `pairstat-core` provides the foundation the other crates build on:
//!
//! - **Error types**: [`PairstatError`] and [`Result`] for structured error handling
//! - **Traits**: [`Scored`] and [`Summarizable`], implemented by test results,
//!   tables and result bundles

pub mod error;
pub mod traits;

pub use error::{PairstatError, Result};
pub use traits::*;
