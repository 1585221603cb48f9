//! Reporting: the goodness-of-fit decision table and formatted terminal output.

pub mod decision;
pub mod format;

pub use decision::*;
pub use format::*;
