//! Distribution fitting and scoring.
//!
//! Responsibilities:
//!
//! - maximum-likelihood estimates for each candidate family (`mle`)
//! - K-S and A-D scores against the fitted distributions (`gof`)
//! - per-variable evaluation with failure isolation and best-fit selection (`selection`)

pub mod gof;
pub mod mle;
pub mod selection;

pub use gof::*;
pub use mle::*;
pub use selection::*;
