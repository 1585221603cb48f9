//! Plot-ready series for one variable.
//!
//! These are plain data (no drawing) so the ASCII renderer and the TUI chart
//! share the same numbers:
//!
//! - histogram (density-normalised) with a Gaussian KDE overlay
//! - boxplot summary with 1.5·IQR whiskers
//! - normal Q-Q points with a least-squares reference line
//! - density of the recommended distribution

use statrs::distribution::{ContinuousCDF, Normal};

use crate::describe::{quantile_sorted, sorted};
use crate::domain::{CandidateEvaluation, DistributionKind, Variable};
use crate::math::linear_fit;
use crate::models::FittedDistribution;

/// Points on the KDE and best-fit density grids.
pub const CURVE_POINTS: usize = 200;
/// KDE grid extends this many bandwidths past the data.
const KDE_CUT: f64 = 3.0;
const MAX_BINS: usize = 200;
const WHISKER_IQR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Counts scaled so the bars integrate to one.
    pub density: Vec<f64>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QqPlot {
    /// `(theoretical quantile, ordered value)`.
    pub points: Vec<(f64, f64)>,
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestFitCurve {
    pub distribution: DistributionKind,
    pub points: Vec<(f64, f64)>,
}

/// Every series the diagnostic views need for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePlots {
    pub variable: Variable,
    pub histogram: Option<Histogram>,
    pub kde: Vec<(f64, f64)>,
    pub boxplot: Option<BoxSummary>,
    pub qq: Option<QqPlot>,
    pub best_fit: Option<BestFitCurve>,
}

pub fn build_plots(values: &[f64], eval: &CandidateEvaluation) -> VariablePlots {
    VariablePlots {
        variable: eval.variable,
        histogram: histogram(values),
        kde: kde(values, CURVE_POINTS),
        boxplot: boxplot(values),
        qq: normal_qq(values),
        best_fit: best_fit_curve(values, eval, CURVE_POINTS),
    }
}

/// Bin width: the smaller of the Sturges and Freedman–Diaconis widths.
///
/// Freedman–Diaconis is skipped when the IQR is zero.
pub fn bin_width(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    let range = sorted[n - 1] - sorted[0];
    let sturges = range / ((n as f64).log2() + 1.0);
    let iqr = quantile_sorted(sorted, 0.75) - quantile_sorted(sorted, 0.25);
    let fd = 2.0 * iqr / (n as f64).cbrt();
    if fd > 0.0 { sturges.min(fd) } else { sturges }
}

pub fn histogram(values: &[f64]) -> Option<Histogram> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    let n = s.len();
    let (lo, hi) = (s[0], s[n - 1]);

    let (lo, hi, bins) = if hi > lo {
        let bins = ((hi - lo) / bin_width(&s)).ceil() as usize;
        (lo, hi, bins.clamp(1, MAX_BINS))
    } else {
        (lo - 0.5, hi + 0.5, 1)
    };
    let width = (hi - lo) / bins as f64;

    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in &s {
        let idx = ((v - lo) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    let density = counts
        .iter()
        .map(|&c| c as f64 / (n as f64 * width))
        .collect();

    Some(Histogram {
        edges,
        counts,
        density,
    })
}

/// Gaussian kernel density estimate with Scott's bandwidth `σ · n^(-1/5)`.
pub fn kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let n_f = n as f64;
    let mean = values.iter().sum::<f64>() / n_f;
    let sd = (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n_f - 1.0)).sqrt();
    let h = sd * n_f.powf(-0.2);
    if !(h.is_finite() && h > 0.0) {
        return Vec::new();
    }

    let (lo, hi) = min_max(values);
    let (lo, hi) = (lo - KDE_CUT * h, hi + KDE_CUT * h);
    let norm = 1.0 / (n_f * h * (2.0 * std::f64::consts::PI).sqrt());
    grid(lo, hi, points)
        .map(|x| {
            let sum: f64 = values
                .iter()
                .map(|xi| {
                    let z = (x - xi) / h;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, norm * sum)
        })
        .collect()
}

pub fn boxplot(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25);
    let q3 = quantile_sorted(&s, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - WHISKER_IQR * iqr;
    let hi_fence = q3 + WHISKER_IQR * iqr;

    let inside: Vec<f64> = s.iter().copied().filter(|v| (lo_fence..=hi_fence).contains(v)).collect();
    let outliers = s.iter().copied().filter(|v| !(lo_fence..=hi_fence).contains(v)).collect();

    Some(BoxSummary {
        q1,
        median: quantile_sorted(&s, 0.5),
        q3,
        whisker_low: inside.first().copied().unwrap_or(q1),
        whisker_high: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Filliben's estimate of the uniform order statistic medians.
pub fn filliben_positions(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let n_f = n as f64;
    let last = 0.5f64.powf(1.0 / n_f);
    (1..=n)
        .map(|i| match i {
            1 => 1.0 - last,
            i if i == n => last,
            i => (i as f64 - 0.3175) / (n_f + 0.365),
        })
        .collect()
}

/// Normal probability plot with its least-squares line.
pub fn normal_qq(values: &[f64]) -> Option<QqPlot> {
    if values.len() < 2 {
        return None;
    }
    let standard = Normal::new(0.0, 1.0).ok()?;
    let ordered = sorted(values);
    let theoretical: Vec<f64> = filliben_positions(ordered.len())
        .into_iter()
        .map(|p| standard.inverse_cdf(p))
        .collect();
    let (slope, intercept, r) = linear_fit(&theoretical, &ordered)?;

    Some(QqPlot {
        points: theoretical.into_iter().zip(ordered).collect(),
        slope,
        intercept,
        r,
    })
}

/// Density of the recommended distribution between the sample min and max.
pub fn best_fit_curve(values: &[f64], eval: &CandidateEvaluation, points: usize) -> Option<BestFitCurve> {
    let params = eval.best_record()?.params?;
    let dist = FittedDistribution::new(&params).ok()?;
    if values.is_empty() {
        return None;
    }
    let (lo, hi) = min_max(values);
    Some(BestFitCurve {
        distribution: dist.kind(),
        points: grid(lo, hi, points).map(|x| (x, dist.pdf(x))).collect(),
    })
}

fn grid(lo: f64, hi: f64, points: usize) -> impl Iterator<Item = f64> {
    let step = if points > 1 { (hi - lo) / (points - 1) as f64 } else { 0.0 };
    (0..points).map(move |i| lo + step * i as f64)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
