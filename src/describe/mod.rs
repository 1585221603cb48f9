//! Descriptive statistics for the cleaned observation sets.

pub mod summary;

pub use summary::*;
