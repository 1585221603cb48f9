//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the measured variables and candidate distribution families
//! - fit outputs (`FitRecord`, `CandidateEvaluation`)
//! - decision table rows and summary statistics
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
