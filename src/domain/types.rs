//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to CSV/JSON
//! - rendered by both the terminal report and the TUI

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One of the two measured variables of the queueing study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Arrivals,
    Service,
}

impl Variable {
    pub const ALL: [Variable; 2] = [Variable::Arrivals, Variable::Service];

    /// Short label used in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            Variable::Arrivals => "Arrivals",
            Variable::Service => "Service",
        }
    }

    /// Long title used for plots.
    pub fn title(self) -> &'static str {
        match self {
            Variable::Arrivals => "Inter-arrival times",
            Variable::Service => "Service times",
        }
    }
}

/// Candidate distribution families, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    Exponential,
    Normal,
    Lognormal,
    Gamma,
}

impl DistributionKind {
    /// Fixed candidate order used for evaluation and for table rows.
    pub const ALL: [DistributionKind; 4] = [
        DistributionKind::Exponential,
        DistributionKind::Normal,
        DistributionKind::Lognormal,
        DistributionKind::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DistributionKind::Exponential => "Exponential",
            DistributionKind::Normal => "Normal",
            DistributionKind::Lognormal => "Lognormal",
            DistributionKind::Gamma => "Gamma",
        }
    }

    /// Whether the family is only fitted on strictly positive values.
    pub fn requires_positive(self) -> bool {
        matches!(self, DistributionKind::Lognormal | DistributionKind::Gamma)
    }
}

/// Kendall-style process letter for an arrival or service distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueNotation {
    /// Markovian (exponential).
    M,
    /// General.
    G,
    /// Normal.
    N,
    /// Deterministic / other.
    D,
}

impl QueueNotation {
    pub fn letter(self) -> &'static str {
        match self {
            QueueNotation::M => "M",
            QueueNotation::G => "G",
            QueueNotation::N => "N",
            QueueNotation::D => "D",
        }
    }
}

/// Qualitative fit label bucketed from a K-S p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitLabel {
    Excellent,
    Good,
    Acceptable,
    Marginal,
    Poor,
    /// No p-value was available (the candidate could not be fitted).
    Undefined,
}

impl FitLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            FitLabel::Excellent => "Excellent",
            FitLabel::Good => "Good",
            FitLabel::Acceptable => "Acceptable",
            FitLabel::Marginal => "Marginal",
            FitLabel::Poor => "Poor",
            FitLabel::Undefined => "Undefined",
        }
    }
}

/// Accept/reject outcome of the goodness-of-fit hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
    Undefined,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "Accept",
            Decision::Reject => "Reject",
            Decision::Undefined => "Undefined",
        }
    }
}

/// Estimated parameters of a fitted distribution.
///
/// Conventions follow the usual `loc`/`scale` parameterisation:
/// the density of `x` is the standard density of `(x - loc) / scale`, divided by `scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum FittedParams {
    Exponential { loc: f64, scale: f64 },
    Normal { mean: f64, std_dev: f64 },
    /// `ln(x - loc)` is normal with mean `ln(scale)` and standard deviation `shape`.
    Lognormal { shape: f64, loc: f64, scale: f64 },
    Gamma { shape: f64, loc: f64, scale: f64 },
}

/// Fit quality for a single candidate distribution.
///
/// A record with `params == None` is "undefined": the candidate could not be
/// fitted and `failure` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub distribution: DistributionKind,
    pub params: Option<FittedParams>,
    pub ks_statistic: Option<f64>,
    pub ks_p_value: Option<f64>,
    pub ad_statistic: Option<f64>,
    pub failure: Option<String>,
}

impl FitRecord {
    pub fn undefined(distribution: DistributionKind, reason: impl Into<String>) -> Self {
        Self {
            distribution,
            params: None,
            ks_statistic: None,
            ks_p_value: None,
            ad_statistic: None,
            failure: Some(reason.into()),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.ks_p_value.is_some()
    }
}

/// All candidate fits for one variable plus the recommended family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub variable: Variable,
    /// One record per `DistributionKind::ALL`, in that order.
    pub records: Vec<FitRecord>,
    pub best: Option<DistributionKind>,
}

impl CandidateEvaluation {
    pub fn record(&self, kind: DistributionKind) -> Option<&FitRecord> {
        self.records.iter().find(|r| r.distribution == kind)
    }

    pub fn best_record(&self) -> Option<&FitRecord> {
        self.best.and_then(|kind| self.record(kind))
    }
}

/// One row of the exported goodness-of-fit decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub variable: Variable,
    pub distribution: DistributionKind,
    pub ks_p_value: Option<f64>,
    pub ad_statistic: Option<f64>,
    pub label: FitLabel,
    pub decision: Decision,
    pub notation: QueueNotation,
}

/// Descriptive statistics for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator).
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Biased sample skewness (`m3 / m2^1.5`).
    pub skewness: f64,
    /// Biased excess kurtosis (`m4 / m2^2 - 3`).
    pub kurtosis: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` / environment defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub arrivals_column: String,
    pub service_column: String,
    /// Also drop rows whose service value is not strictly positive.
    pub strict: bool,

    pub out_dir: PathBuf,
    pub decision_file: String,
    pub summary_file: String,
    pub export_json: Option<PathBuf>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            arrivals_column: "arrivals".to_string(),
            service_column: "service".to_string(),
            strict: false,
            out_dir: PathBuf::from("."),
            decision_file: DEFAULT_DECISION_FILE.to_string(),
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            export_json: None,
            plot: true,
            plot_width: 72,
            plot_height: 16,
        }
    }
}

/// Default input path (relative to the working directory).
pub const DEFAULT_INPUT: &str = "observations.csv";
/// Default file name for the goodness-of-fit decision table.
pub const DEFAULT_DECISION_FILE: &str = "goodness_of_fit.csv";
/// Default file name for the descriptive statistics table.
pub const DEFAULT_SUMMARY_FILE: &str = "summary_statistics.csv";
