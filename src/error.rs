//! Application-level error type.
//!
//! Every fatal failure carries the process exit code it should map to:
//!
//! - `2`: input or output problem (missing file, unreadable CSV, missing column, failed write)
//! - `3`: no usable data after cleaning
//! - `4`: internal or terminal failure

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single candidate distribution could not be fitted.
///
/// These never abort a run: the candidate is recorded as undefined and the
/// remaining candidates are still evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("insufficient data: need at least {needed} values, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("degenerate sample: {0}")]
    Degenerate(&'static str),
    #[error("estimation did not converge: {0}")]
    NonConvergence(String),
    #[error("invalid fitted parameters: {0}")]
    InvalidParameters(String),
}
