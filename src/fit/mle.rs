//! Maximum-likelihood estimation for the four candidate families.
//!
//! Closed forms:
//! - Exponential: `loc = min(x)`, `scale = mean(x) - min(x)`
//! - Normal: sample mean and population standard deviation
//! - Lognormal (loc fixed at 0): `shape = sd(ln x)`, `scale = exp(mean(ln x))`
//!
//! Gamma (shape, loc, scale) has no closed form. For a fixed location the
//! shape solves `ln a - ψ(a) = ln ȳ - mean(ln y)` with `y = x - loc` and
//! `scale = ȳ / a`; the location is then chosen to maximise this profile
//! log-likelihood over `δ = min(x) - loc` (log-spaced grid, then
//! golden-section refinement). No randomness is involved, so repeated fits
//! are bit-identical.

use statrs::function::gamma::{digamma, ln_gamma};
use tracing::debug;

use crate::domain::FittedParams;
use crate::error::FitError;
use crate::math::trigamma;

/// Minimum count of strictly positive values for Lognormal and Gamma.
pub const MIN_POSITIVE: usize = 3;

/// Number of log-spaced `δ` points scanned before refinement.
const GAMMA_GRID_STEPS: usize = 81;
/// `δ` range as multiples of the sample span.
const GAMMA_DELTA_MIN: f64 = 1e-6;
const GAMMA_DELTA_MAX: f64 = 1e2;
const GOLDEN_ITERS: usize = 80;

const NEWTON_MAX_ITERS: usize = 100;
const NEWTON_TOL: f64 = 1e-12;

pub fn fit_exponential(x: &[f64]) -> Result<FittedParams, FitError> {
    require_len(x, 2)?;
    let loc = min(x);
    let scale = mean(x) - loc;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FitError::Degenerate("all values are equal"));
    }
    Ok(FittedParams::Exponential { loc, scale })
}

pub fn fit_normal(x: &[f64]) -> Result<FittedParams, FitError> {
    require_len(x, 2)?;
    let m = mean(x);
    let var = x.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64;
    let std_dev = var.sqrt();
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return Err(FitError::Degenerate("zero variance"));
    }
    Ok(FittedParams::Normal { mean: m, std_dev })
}

/// Lognormal with location fixed at zero. `x` must be strictly positive.
pub fn fit_lognormal(x: &[f64]) -> Result<FittedParams, FitError> {
    require_len(x, MIN_POSITIVE)?;
    require_positive(x)?;

    let logs: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let mu = mean(&logs);
    let var = logs.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / logs.len() as f64;
    let shape = var.sqrt();
    if !(shape.is_finite() && shape > 0.0) {
        return Err(FitError::Degenerate("zero variance of log values"));
    }

    Ok(FittedParams::Lognormal {
        shape,
        loc: 0.0,
        scale: mu.exp(),
    })
}

/// Three-parameter gamma. `x` must be strictly positive.
pub fn fit_gamma(x: &[f64]) -> Result<FittedParams, FitError> {
    require_len(x, MIN_POSITIVE)?;
    require_positive(x)?;

    let x_min = min(x);
    let span = max(x) - x_min;
    if !(span.is_finite() && span > 0.0) {
        return Err(FitError::Degenerate("all values are equal"));
    }

    let lo = (span * GAMMA_DELTA_MIN).ln();
    let hi = (span * GAMMA_DELTA_MAX).ln();
    let step = (hi - lo) / (GAMMA_GRID_STEPS - 1) as f64;
    let profile_at = |ln_delta: f64| gamma_profile(x, x_min - ln_delta.exp());

    let mut best: Option<(usize, GammaProfile)> = None;
    for i in 0..GAMMA_GRID_STEPS {
        if let Some(p) = profile_at(lo + step * i as f64) {
            if best.as_ref().is_none_or(|(_, b)| p.loglik > b.loglik) {
                best = Some((i, p));
            }
        }
    }
    let Some((idx, grid_best)) = best else {
        return Err(FitError::NonConvergence(
            "profile likelihood undefined on the location grid".to_string(),
        ));
    };

    // Golden-section refinement in the bracket around the best grid point.
    let mut a = lo + step * idx.saturating_sub(1) as f64;
    let mut b = lo + step * (idx + 1).min(GAMMA_GRID_STEPS - 1) as f64;
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let score = |t: f64| profile_at(t).map(|p| p.loglik).unwrap_or(f64::NEG_INFINITY);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = score(c);
    let mut fd = score(d);
    for _ in 0..GOLDEN_ITERS {
        if fc >= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = score(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = score(d);
        }
    }

    let refined_t = if fc >= fd { c } else { d };
    let mut chosen = grid_best;
    if let Some(p) = profile_at(refined_t) {
        if p.loglik > chosen.loglik {
            chosen = p;
        }
    }

    debug!(
        shape = chosen.shape,
        loc = chosen.loc,
        scale = chosen.scale,
        loglik = chosen.loglik,
        "gamma profile maximum"
    );

    Ok(FittedParams::Gamma {
        shape: chosen.shape,
        loc: chosen.loc,
        scale: chosen.scale,
    })
}

#[derive(Debug, Clone, Copy)]
struct GammaProfile {
    shape: f64,
    loc: f64,
    scale: f64,
    loglik: f64,
}

/// Shape/scale MLE and log-likelihood for a fixed location.
fn gamma_profile(x: &[f64], loc: f64) -> Option<GammaProfile> {
    let n = x.len() as f64;
    let mut sum = 0.0;
    let mut sum_ln = 0.0;
    for &v in x {
        let y = v - loc;
        if !(y > 0.0) {
            return None;
        }
        sum += y;
        sum_ln += y.ln();
    }

    let y_mean = sum / n;
    let shape = gamma_shape_mle(y_mean.ln() - sum_ln / n).ok()?;
    let scale = y_mean / shape;
    let loglik = (shape - 1.0) * sum_ln - sum / scale - n * shape * scale.ln() - n * ln_gamma(shape);

    loglik.is_finite().then_some(GammaProfile {
        shape,
        loc,
        scale,
        loglik,
    })
}

/// Solve `ln a - ψ(a) = s` for the gamma shape `a` (Newton, from Minka's start).
pub fn gamma_shape_mle(s: f64) -> Result<f64, FitError> {
    if !(s.is_finite() && s > 0.0) {
        return Err(FitError::Degenerate("no spread in log values"));
    }

    let mut a = (3.0 - s + ((s - 3.0).powi(2) + 24.0 * s).sqrt()) / (12.0 * s);
    for _ in 0..NEWTON_MAX_ITERS {
        let f = a.ln() - digamma(a) - s;
        let fp = 1.0 / a - trigamma(a);
        let mut next = a - f / fp;
        if !(next.is_finite() && next > 0.0) {
            next = a / 2.0;
        }
        if (next - a).abs() <= NEWTON_TOL * a {
            return Ok(next);
        }
        a = next;
    }

    if a.is_finite() && a > 0.0 {
        Ok(a)
    } else {
        Err(FitError::NonConvergence(format!("gamma shape for s={s}")))
    }
}

fn require_len(x: &[f64], needed: usize) -> Result<(), FitError> {
    if x.len() < needed {
        return Err(FitError::InsufficientData {
            needed,
            got: x.len(),
        });
    }
    Ok(())
}

fn require_positive(x: &[f64]) -> Result<(), FitError> {
    if x.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(FitError::Degenerate("values must be strictly positive"))
    }
}

fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

fn min(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(x: &[f64]) -> f64 {
    x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
