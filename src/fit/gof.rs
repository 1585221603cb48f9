//! Goodness-of-fit scores: Kolmogorov–Smirnov test and Anderson–Darling statistic.

use crate::describe::sorted;
use crate::error::FitError;
use crate::math::{kolmogorov_sf, ln_norm_cdf, ln_norm_sf};
use crate::models::FittedDistribution;

/// Reference family for the Anderson–Darling statistic.
///
/// Only the normal and exponential families are supported; Lognormal and
/// Gamma candidates are scored against one of these as an approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdReference {
    /// Mean and sample standard deviation (`n - 1`) estimated from the data.
    Normal,
    /// Location 0, scale estimated as the sample mean.
    Exponential,
}

/// Result of a one-sample K-S test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sided one-sample K-S test of `data` against a fitted CDF.
///
/// The p-value treats the fitted parameters as known, the usual (and
/// optimistic) convention when testing against an estimated distribution.
pub fn ks_test(data: &[f64], dist: &FittedDistribution) -> Result<KsResult, FitError> {
    if data.is_empty() {
        return Err(FitError::InsufficientData { needed: 1, got: 0 });
    }

    let sorted = sorted(data);
    let n = sorted.len() as f64;
    let mut d_plus = 0.0f64;
    let mut d_minus = 0.0f64;
    for (i, &x) in sorted.iter().enumerate() {
        let f = dist.cdf(x);
        if !f.is_finite() {
            return Err(FitError::InvalidParameters(format!("non-finite CDF at x={x}")));
        }
        d_plus = d_plus.max((i + 1) as f64 / n - f);
        d_minus = d_minus.max(f - i as f64 / n);
    }

    let statistic = d_plus.max(d_minus);
    let p_value = kolmogorov_sf(sorted.len(), statistic);
    if !p_value.is_finite() {
        return Err(FitError::NonConvergence(format!("K-S p-value for D={statistic}")));
    }

    Ok(KsResult { statistic, p_value })
}

/// Anderson–Darling `A²` of `data` against a reference family with estimated parameters.
pub fn anderson_darling(data: &[f64], reference: AdReference) -> Result<f64, FitError> {
    if data.len() < 2 {
        return Err(FitError::InsufficientData {
            needed: 2,
            got: data.len(),
        });
    }

    let y = sorted(data);
    let n = y.len();
    let n_f = n as f64;
    let mean = y.iter().sum::<f64>() / n_f;

    let (ln_cdf, ln_sf): (Vec<f64>, Vec<f64>) = match reference {
        AdReference::Normal => {
            let var = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n_f - 1.0);
            let s = var.sqrt();
            if !(s.is_finite() && s > 0.0) {
                return Err(FitError::Degenerate("zero variance"));
            }
            y.iter()
                .map(|v| {
                    let w = (v - mean) / s;
                    (ln_norm_cdf(w), ln_norm_sf(w))
                })
                .unzip()
        }
        AdReference::Exponential => {
            if !(mean.is_finite() && mean > 0.0) {
                return Err(FitError::Degenerate("non-positive mean"));
            }
            y.iter()
                .map(|v| {
                    let w = v / mean;
                    ((-(-w).exp_m1()).ln(), -w)
                })
                .unzip()
        }
    };

    let mut acc = 0.0;
    for i in 0..n {
        let weight = (2 * i + 1) as f64 / n_f;
        acc += weight * (ln_cdf[i] + ln_sf[n - 1 - i]);
    }
    let a2 = -n_f - acc;

    if a2.is_finite() {
        Ok(a2)
    } else {
        Err(FitError::Degenerate("Anderson-Darling statistic is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FittedParams;

    fn normal(mean: f64, std_dev: f64) -> FittedDistribution {
        FittedDistribution::new(&FittedParams::Normal { mean, std_dev }).unwrap()
    }

    #[test]
    fn ks_statistic_for_five_points() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let dist = normal(3.0, 2f64.sqrt());
        let res = ks_test(&data, &dist).unwrap();
        // Max gap is at x = 2 and x = 4, both Φ(1/√2) - 3/5 analytically.
        let expected = (0.4 - dist.cdf(2.0)).max(dist.cdf(4.0) - 0.6);
        assert!((res.statistic - expected).abs() < 1e-12, "D={}", res.statistic);
        // erfc is accurate to roughly 1e-10 here.
        let closed_form = 0.4 - 0.5 * statrs::function::erf::erfc(0.5);
        assert!((res.statistic - closed_form).abs() < 1e-9, "D={}", res.statistic);
        assert!(res.p_value > 0.9);
    }

    #[test]
    fn ks_handles_unsorted_input() {
        let a = ks_test(&[5.0, 1.0, 4.0, 2.0, 3.0], &normal(3.0, 1.5)).unwrap();
        let b = ks_test(&[1.0, 2.0, 3.0, 4.0, 5.0], &normal(3.0, 1.5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn anderson_darling_normal_small_for_normal_quantiles() {
        let n = 50;
        let data: Vec<f64> = (0..n)
            .map(|i| {
                let u = (i as f64 + 0.5) / n as f64;
                statrs::distribution::ContinuousCDF::inverse_cdf(
                    &statrs::distribution::Normal::new(10.0, 2.0).unwrap(),
                    u,
                )
            })
            .collect();
        let a2 = anderson_darling(&data, AdReference::Normal).unwrap();
        assert!(a2 < 0.3, "A2={a2}");

        let skewed: Vec<f64> = data.iter().map(|v| (v / 2.0).exp()).collect();
        let a2_skewed = anderson_darling(&skewed, AdReference::Normal).unwrap();
        assert!(a2_skewed > a2);
    }

    #[test]
    fn anderson_darling_exponential_rejects_zero() {
        // A zero observation sends ln F(0) to -inf.
        let err = anderson_darling(&[0.0, 1.0, 2.0], AdReference::Exponential).unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
        assert!(anderson_darling(&[0.5, 1.0, 2.0], AdReference::Exponential).is_ok());
    }
}
