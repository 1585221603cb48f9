//! Diagnostic plots: series preparation and ASCII rendering.

pub mod ascii;
pub mod series;

pub use ascii::*;
pub use series::*;
