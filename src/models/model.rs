//! Evaluation of fitted distributions.
//!
//! The scorer and the plots rely on two primitive operations:
//! - `cdf(x)` for the Kolmogorov–Smirnov test
//! - `pdf(x)` for the best-fit density overlay
//!
//! Both shift by the fitted location and delegate to `statrs`.

use statrs::distribution::{Continuous, ContinuousCDF, Exp, Gamma, LogNormal, Normal};

use crate::domain::{DistributionKind, FittedParams};
use crate::error::FitError;

/// A fitted distribution ready for evaluation.
#[derive(Debug, Clone)]
pub enum FittedDistribution {
    Exponential { loc: f64, dist: Exp },
    Normal { dist: Normal },
    Lognormal { loc: f64, dist: LogNormal },
    Gamma { loc: f64, dist: Gamma },
}

impl FittedDistribution {
    /// Build the `statrs` distribution for a set of fitted parameters.
    pub fn new(params: &FittedParams) -> Result<Self, FitError> {
        let invalid = |e: statrs::StatsError| FitError::InvalidParameters(e.to_string());
        match *params {
            FittedParams::Exponential { loc, scale } => {
                check_scale(scale)?;
                Ok(Self::Exponential {
                    loc,
                    dist: Exp::new(1.0 / scale).map_err(invalid)?,
                })
            }
            FittedParams::Normal { mean, std_dev } => {
                check_scale(std_dev)?;
                Ok(Self::Normal {
                    dist: Normal::new(mean, std_dev).map_err(invalid)?,
                })
            }
            FittedParams::Lognormal { shape, loc, scale } => {
                check_scale(shape)?;
                check_scale(scale)?;
                Ok(Self::Lognormal {
                    loc,
                    dist: LogNormal::new(scale.ln(), shape).map_err(invalid)?,
                })
            }
            FittedParams::Gamma { shape, loc, scale } => {
                check_scale(shape)?;
                check_scale(scale)?;
                Ok(Self::Gamma {
                    loc,
                    dist: Gamma::new(shape, 1.0 / scale).map_err(invalid)?,
                })
            }
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Exponential { .. } => DistributionKind::Exponential,
            Self::Normal { .. } => DistributionKind::Normal,
            Self::Lognormal { .. } => DistributionKind::Lognormal,
            Self::Gamma { .. } => DistributionKind::Gamma,
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            Self::Exponential { loc, dist } => positive_part(x - loc, |y| dist.cdf(y), 0.0),
            Self::Normal { dist } => dist.cdf(x),
            Self::Lognormal { loc, dist } => positive_part(x - loc, |y| dist.cdf(y), 0.0),
            Self::Gamma { loc, dist } => positive_part(x - loc, |y| dist.cdf(y), 0.0),
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            Self::Exponential { loc, dist } => positive_part(x - loc, |y| dist.pdf(y), 0.0),
            Self::Normal { dist } => dist.pdf(x),
            Self::Lognormal { loc, dist } => positive_part(x - loc, |y| dist.pdf(y), 0.0),
            Self::Gamma { loc, dist } => positive_part(x - loc, |y| dist.pdf(y), 0.0),
        }
    }
}

fn check_scale(v: f64) -> Result<(), FitError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(FitError::InvalidParameters(format!(
            "scale-type parameter must be finite and > 0, got {v}"
        )))
    }
}

/// Evaluate `f(y)` on the support `y > 0`, returning `outside` elsewhere.
fn positive_part(y: f64, f: impl Fn(f64) -> f64, outside: f64) -> f64 {
    if y > 0.0 { f(y) } else { outside }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_is_shifted_by_loc() {
        let d = FittedDistribution::new(&FittedParams::Exponential { loc: 1.0, scale: 2.0 }).unwrap();
        assert_eq!(d.cdf(0.5), 0.0);
        assert!((d.cdf(3.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert!((d.pdf(1.0 + 1e-12) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn lognormal_median_is_scale() {
        let d = FittedDistribution::new(&FittedParams::Lognormal {
            shape: 0.7,
            loc: 0.0,
            scale: 3.0,
        })
        .unwrap();
        assert!((d.cdf(3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn gamma_with_unit_shape_matches_exponential() {
        let g = FittedDistribution::new(&FittedParams::Gamma {
            shape: 1.0,
            loc: 0.5,
            scale: 2.0,
        })
        .unwrap();
        let e = FittedDistribution::new(&FittedParams::Exponential { loc: 0.5, scale: 2.0 }).unwrap();
        for &x in &[0.6, 1.0, 2.5, 7.0] {
            assert!((g.cdf(x) - e.cdf(x)).abs() < 1e-10);
        }
    }

    #[test]
    fn rejects_non_positive_scale() {
        let err = FittedDistribution::new(&FittedParams::Normal { mean: 0.0, std_dev: 0.0 }).unwrap_err();
        assert!(matches!(err, FitError::InvalidParameters(_)));
    }
}
