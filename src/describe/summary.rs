//! Per-variable summary: location, spread, quartiles and shape.

use crate::domain::SummaryStats;

/// Summary statistics of `values`; `None` for an empty slice.
///
/// A single value yields `std_dev`, `skewness` and `kurtosis` of NaN, the
/// same way a spreadsheet reports them.
pub fn describe(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }

    let sorted = sorted(values);
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in &sorted {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let std_dev = if sorted.len() > 1 { (m2 / (n - 1.0)).sqrt() } else { f64::NAN };
    m2 /= n;
    m3 /= n;
    m4 /= n;

    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (f64::NAN, f64::NAN)
    };

    Some(SummaryStats {
        count: sorted.len(),
        mean,
        std_dev,
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        skewness,
        kurtosis,
    })
}

/// Quantile of already sorted data by linear interpolation between order
/// statistics (position `q * (n - 1)`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn describe_small_sequence() {
        let s = describe(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert!(close(s.mean, 3.0));
        assert!(close(s.std_dev, 2.5f64.sqrt()));
        assert_eq!((s.min, s.q1, s.median, s.q3, s.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        assert!(close(s.skewness, 0.0));
        // m4 / m2^2 = 6.8 / 4 = 1.7
        assert!(close(s.kurtosis, -1.3));
    }

    #[test]
    fn quartiles_interpolate_between_order_statistics() {
        let s = describe(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert!(close(s.q1, 17.5));
        assert!(close(s.median, 25.0));
        assert!(close(s.q3, 32.5));
    }

    #[test]
    fn right_skewed_sample_has_positive_skewness() {
        let s = describe(&[1.0, 1.0, 1.0, 1.0, 10.0]).unwrap();
        assert!(s.skewness > 1.0);
        assert!(s.kurtosis > 0.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(describe(&[]).is_none());

        let one = describe(&[7.0]).unwrap();
        assert_eq!(one.count, 1);
        assert_eq!(one.median, 7.0);
        assert!(one.std_dev.is_nan());

        let flat = describe(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(flat.std_dev, 0.0);
        assert!(flat.skewness.is_nan());
    }
}
