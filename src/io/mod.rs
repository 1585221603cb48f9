//! Input/output helpers.
//!
//! - CSV ingest + cleaning (`ingest`)
//! - result exports (CSV/JSON) with the permission fallback (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
