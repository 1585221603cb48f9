//! Special functions not provided by `statrs`.

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;

/// Trigamma function `ψ'(x)` for `x > 0`.
///
/// Uses the recurrence `ψ'(x) = ψ'(x + 1) + 1/x²` to shift `x` above 10, then
/// the asymptotic series.
pub fn trigamma(x: f64) -> f64 {
    if !(x.is_finite() && x > 0.0) {
        return f64::NAN;
    }

    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }

    let x2 = 1.0 / (x * x);
    let series = 1.0 / x
        + x2 / 2.0
        + (1.0 / 6.0 - x2 * (1.0 / 30.0 - x2 * (1.0 / 42.0 - x2 / 30.0))) * x2 / x;
    acc + series
}

/// `ln Φ(z)` for the standard normal CDF.
pub fn ln_norm_cdf(z: f64) -> f64 {
    (0.5 * erfc(-z / SQRT_2)).ln()
}

/// `ln(1 - Φ(z))` for the standard normal CDF.
pub fn ln_norm_sf(z: f64) -> f64 {
    (0.5 * erfc(z / SQRT_2)).ln()
}
