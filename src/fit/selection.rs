//! Candidate evaluation and best-fit selection.
//!
//! For one variable we fit every family in `DistributionKind::ALL` and score it:
//!
//! | family      | sample         | K-S against       | A-D against              |
//! |-------------|----------------|-------------------|--------------------------|
//! | Exponential | all values     | fitted CDF        | exponential family       |
//! | Normal      | all values     | fitted CDF        | normal family            |
//! | Lognormal   | positive only  | fitted CDF        | normal family on `ln x`  |
//! | Gamma       | positive only  | fitted CDF        | exponential family       |
//!
//! The Lognormal and Gamma A-D rows are approximations (there is no reference
//! table for those families here) and are kept as documented behaviour.
//!
//! A failing candidate never aborts the evaluation: it becomes an undefined
//! record carrying the reason.

use tracing::{debug, warn};

use crate::domain::{CandidateEvaluation, DistributionKind, FitRecord, Variable};
use crate::error::FitError;
use crate::fit::gof::{AdReference, anderson_darling, ks_test};
use crate::fit::mle::{MIN_POSITIVE, fit_exponential, fit_gamma, fit_lognormal, fit_normal};
use crate::models::FittedDistribution;

/// Fit and score all candidate families for one variable.
pub fn evaluate_candidates(variable: Variable, values: &[f64]) -> CandidateEvaluation {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();

    let records: Vec<FitRecord> = DistributionKind::ALL
        .iter()
        .map(|&kind| {
            let sample = if kind.requires_positive() { &positive } else { values };
            match evaluate_candidate(kind, sample) {
                Ok(record) => {
                    debug!(
                        variable = variable.label(),
                        distribution = kind.name(),
                        params = ?record.params,
                        ks_p = ?record.ks_p_value,
                        ad = ?record.ad_statistic,
                        "candidate fitted"
                    );
                    record
                }
                Err(err) => {
                    warn!(
                        variable = variable.label(),
                        distribution = kind.name(),
                        "candidate undefined: {err}"
                    );
                    FitRecord::undefined(kind, err.to_string())
                }
            }
        })
        .collect();

    let best = select_best(&records);
    CandidateEvaluation {
        variable,
        records,
        best,
    }
}

/// Fit one family and compute its scores.
///
/// `sample` is already restricted to positive values for families that need it.
pub fn evaluate_candidate(kind: DistributionKind, sample: &[f64]) -> Result<FitRecord, FitError> {
    if kind.requires_positive() && sample.len() < MIN_POSITIVE {
        return Err(FitError::InsufficientData {
            needed: MIN_POSITIVE,
            got: sample.len(),
        });
    }

    let params = match kind {
        DistributionKind::Exponential => fit_exponential(sample)?,
        DistributionKind::Normal => fit_normal(sample)?,
        DistributionKind::Lognormal => fit_lognormal(sample)?,
        DistributionKind::Gamma => fit_gamma(sample)?,
    };
    let dist = FittedDistribution::new(&params)?;
    let ks = ks_test(sample, &dist)?;

    let ad = match kind {
        DistributionKind::Exponential | DistributionKind::Gamma => {
            anderson_darling(sample, AdReference::Exponential)
        }
        DistributionKind::Normal => anderson_darling(sample, AdReference::Normal),
        DistributionKind::Lognormal => {
            let logs: Vec<f64> = sample.iter().map(|v| v.ln()).collect();
            anderson_darling(&logs, AdReference::Normal)
        }
    };
    // The A-D statistic is informational; losing it does not void the K-S result.
    let ad_statistic = match ad {
        Ok(a2) => Some(a2),
        Err(err) => {
            warn!(distribution = kind.name(), "Anderson-Darling statistic unavailable: {err}");
            None
        }
    };

    Ok(FitRecord {
        distribution: kind,
        params: Some(params),
        ks_statistic: Some(ks.statistic),
        ks_p_value: Some(ks.p_value),
        ad_statistic,
        failure: None,
    })
}

/// The candidate with the largest K-S p-value.
///
/// Undefined records are ignored; ties keep the earlier candidate.
pub fn select_best(records: &[FitRecord]) -> Option<DistributionKind> {
    let mut best: Option<(DistributionKind, f64)> = None;
    for r in records {
        let Some(p) = r.ks_p_value.filter(|p| p.is_finite()) else {
            continue;
        };
        if best.is_none_or(|(_, best_p)| p > best_p) {
            best = Some((r.distribution, p));
        }
    }
    best.map(|(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Exp};
    use statrs::distribution::{ContinuousCDF, Normal};

    use crate::domain::FittedParams;

    fn p_value(eval: &CandidateEvaluation, kind: DistributionKind) -> Option<f64> {
        eval.record(kind).and_then(|r| r.ks_p_value)
    }

    fn record_with_p(kind: DistributionKind, p: Option<f64>) -> FitRecord {
        FitRecord {
            distribution: kind,
            params: None,
            ks_statistic: None,
            ks_p_value: p,
            ad_statistic: None,
            failure: None,
        }
    }

    #[test]
    fn records_follow_fixed_candidate_order() {
        let eval = evaluate_candidates(Variable::Service, &[1.2, 0.7, 3.1, 2.2, 1.9, 0.4]);
        let kinds: Vec<_> = eval.records.iter().map(|r| r.distribution).collect();
        assert_eq!(kinds, DistributionKind::ALL.to_vec());
    }

    #[test]
    fn normal_beats_exponential_on_symmetric_sequence() {
        let eval = evaluate_candidates(Variable::Arrivals, &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let normal = eval.record(DistributionKind::Normal).unwrap();
        let Some(FittedParams::Normal { mean, .. }) = normal.params else {
            panic!("normal should be defined");
        };
        assert_eq!(mean, 3.0);

        let p_norm = p_value(&eval, DistributionKind::Normal).unwrap();
        let p_exp = p_value(&eval, DistributionKind::Exponential).unwrap();
        assert!(p_norm >= p_exp, "normal p={p_norm} exponential p={p_exp}");
    }

    #[test]
    fn symmetric_sample_is_not_classified_as_exponential() {
        let dist = Normal::new(20.0, 2.0).unwrap();
        let n = 60;
        let values: Vec<f64> = (0..n)
            .map(|i| dist.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect();

        let eval = evaluate_candidates(Variable::Service, &values);
        let p_norm = p_value(&eval, DistributionKind::Normal).unwrap();
        let p_exp = p_value(&eval, DistributionKind::Exponential).unwrap();
        assert!(p_norm > 0.9, "p_norm={p_norm}");
        assert!(p_exp < p_norm);
        assert_ne!(eval.best, Some(DistributionKind::Exponential));
    }

    #[test]
    fn right_skewed_sample_prefers_exponential_or_gamma() {
        let n = 60;
        let values: Vec<f64> = (0..n)
            .map(|i| -2.0 * (1.0 - (i as f64 + 0.5) / n as f64).ln())
            .collect();

        let eval = evaluate_candidates(Variable::Arrivals, &values);
        let best = eval.best.unwrap();
        assert!(
            matches!(best, DistributionKind::Exponential | DistributionKind::Gamma),
            "best={best:?}"
        );
        let p_best = p_value(&eval, best).unwrap();
        let p_norm = p_value(&eval, DistributionKind::Normal).unwrap();
        assert!(p_best > p_norm);
    }

    #[test]
    fn seeded_exponential_sample_rejects_normal() {
        let mut rng = StdRng::seed_from_u64(11);
        let exp = Exp::new(0.5).unwrap();
        let values: Vec<f64> = (0..2000).map(|_| exp.sample(&mut rng)).collect();

        let eval = evaluate_candidates(Variable::Arrivals, &values);
        assert!(p_value(&eval, DistributionKind::Normal).unwrap() < 0.05);
        assert!(matches!(
            eval.best,
            Some(DistributionKind::Exponential | DistributionKind::Gamma)
        ));
    }

    #[test]
    fn too_few_positive_values_leave_positive_families_undefined() {
        let eval = evaluate_candidates(Variable::Service, &[-1.0, 0.0, 2.0, 5.0]);

        for kind in [DistributionKind::Lognormal, DistributionKind::Gamma] {
            let r = eval.record(kind).unwrap();
            assert!(!r.is_defined());
            assert!(r.ad_statistic.is_none());
            assert!(r.failure.as_deref().unwrap().contains("insufficient data"));
        }
        assert!(eval.record(DistributionKind::Normal).unwrap().is_defined());
        assert!(matches!(
            eval.best,
            Some(DistributionKind::Exponential | DistributionKind::Normal)
        ));
    }

    #[test]
    fn all_undefined_gives_no_recommendation() {
        let eval = evaluate_candidates(Variable::Arrivals, &[4.0]);
        assert!(eval.records.iter().all(|r| !r.is_defined()));
        assert_eq!(eval.best, None);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let values = [0.9, 2.7, 1.4, 5.5, 0.3, 3.8, 2.2, 7.1, 1.0, 0.6];
        let a = evaluate_candidates(Variable::Service, &values);
        let b = evaluate_candidates(Variable::Service, &values);
        assert_eq!(a, b);
    }

    #[test]
    fn select_best_takes_max_and_keeps_first_on_ties() {
        let records = vec![
            record_with_p(DistributionKind::Exponential, Some(0.30)),
            record_with_p(DistributionKind::Normal, Some(0.70)),
            record_with_p(DistributionKind::Lognormal, None),
            record_with_p(DistributionKind::Gamma, Some(0.70)),
        ];
        assert_eq!(select_best(&records), Some(DistributionKind::Normal));
        assert_eq!(
            select_best(&[record_with_p(DistributionKind::Gamma, None)]),
            None
        );
    }
}
