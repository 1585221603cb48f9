//! Fitted distribution evaluation (CDF / density).
//!
//! Kept as small, pure functions over `FittedParams` so the scorer and the
//! plotting code can stay generic.

pub mod model;

pub use model::*;
