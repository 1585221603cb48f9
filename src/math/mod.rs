//! Mathematical utilities: Kolmogorov distribution, special functions, least squares.

pub mod kolmogorov;
pub mod ols;
pub mod special;

pub use kolmogorov::*;
pub use ols::*;
pub use special::*;
