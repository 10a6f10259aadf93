//! Core trait definitions shared across pairstat crates.

/// A type that carries a numeric score (a p-value, an adjusted p-value).
pub trait Scored {
    /// The score value.
    fn score(&self) -> f64;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
