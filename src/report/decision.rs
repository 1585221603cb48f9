//! Decision table: qualitative labels, accept/reject decisions and queueing notation.

use crate::domain::{
    CandidateEvaluation, Decision, DecisionRecord, DistributionKind, FitLabel, QueueNotation, Variable,
};

/// Significance level for the accept/reject decision.
pub const SIGNIFICANCE: f64 = 0.05;

/// Bucket a K-S p-value into a qualitative label.
pub fn label_for(p_value: f64) -> FitLabel {
    if p_value >= 0.90 {
        FitLabel::Excellent
    } else if p_value >= 0.50 {
        FitLabel::Good
    } else if p_value >= 0.20 {
        FitLabel::Acceptable
    } else if p_value >= SIGNIFICANCE {
        FitLabel::Marginal
    } else {
        FitLabel::Poor
    }
}

/// Accept the distribution hypothesis iff `p >= 0.05`.
pub fn decision_for(p_value: f64) -> Decision {
    if p_value >= SIGNIFICANCE {
        Decision::Accept
    } else {
        Decision::Reject
    }
}

/// Queueing-notation letter from a distribution name (case-insensitive).
pub fn notation_for(name: &str) -> QueueNotation {
    match name.trim().to_ascii_lowercase().as_str() {
        "exponential" => QueueNotation::M,
        "gamma" | "lognormal" | "weibull" => QueueNotation::G,
        "normal" => QueueNotation::N,
        _ => QueueNotation::D,
    }
}

impl DistributionKind {
    pub fn notation(self) -> QueueNotation {
        notation_for(self.name())
    }
}

/// Build the combined decision table.
///
/// Rows are grouped by variable in the order given, and by candidate in
/// `DistributionKind::ALL` order within each variable.
pub fn build_decision_table(evaluations: &[CandidateEvaluation]) -> Vec<DecisionRecord> {
    let mut rows = Vec::with_capacity(evaluations.len() * DistributionKind::ALL.len());
    for eval in evaluations {
        for kind in DistributionKind::ALL {
            let (p, ad) = eval
                .record(kind)
                .map(|r| (r.ks_p_value, r.ad_statistic))
                .unwrap_or((None, None));
            rows.push(DecisionRecord {
                variable: eval.variable,
                distribution: kind,
                ks_p_value: p,
                ad_statistic: ad,
                label: p.map(label_for).unwrap_or(FitLabel::Undefined),
                decision: p.map(decision_for).unwrap_or(Decision::Undefined),
                notation: kind.notation(),
            });
        }
    }
    rows
}

/// Recommended family and notation letter for one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub variable: Variable,
    pub distribution: DistributionKind,
    pub p_value: f64,
    pub notation: QueueNotation,
}

pub fn recommendation(eval: &CandidateEvaluation) -> Option<Recommendation> {
    let record = eval.best_record()?;
    Some(Recommendation {
        variable: eval.variable,
        distribution: record.distribution,
        p_value: record.ks_p_value?,
        notation: record.distribution.notation(),
    })
}

/// Kendall-style model string for a single-server queue, e.g. `M/G/1`.
///
/// Variables without a recommendation contribute `D`.
pub fn kendall_model(arrivals: Option<&Recommendation>, service: Option<&Recommendation>) -> String {
    let letter = |r: Option<&Recommendation>| r.map(|r| r.notation).unwrap_or(QueueNotation::D).letter();
    format!("{}/{}/1", letter(arrivals), letter(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitRecord;

    fn eval(variable: Variable, ps: [Option<f64>; 4]) -> CandidateEvaluation {
        let records: Vec<FitRecord> = DistributionKind::ALL
            .iter()
            .zip(ps)
            .map(|(&kind, p)| match p {
                Some(p) => FitRecord {
                    distribution: kind,
                    params: None,
                    ks_statistic: Some(0.1),
                    ks_p_value: Some(p),
                    ad_statistic: Some(0.5),
                    failure: None,
                },
                None => FitRecord::undefined(kind, "insufficient data"),
            })
            .collect();
        let best = crate::fit::select_best(&records);
        CandidateEvaluation {
            variable,
            records,
            best,
        }
    }

    #[test]
    fn label_boundaries_are_inclusive() {
        assert_eq!(label_for(1.0), FitLabel::Excellent);
        assert_eq!(label_for(0.90), FitLabel::Excellent);
        assert_eq!(label_for(0.8999), FitLabel::Good);
        assert_eq!(label_for(0.50), FitLabel::Good);
        assert_eq!(label_for(0.4999), FitLabel::Acceptable);
        assert_eq!(label_for(0.20), FitLabel::Acceptable);
        assert_eq!(label_for(0.1999), FitLabel::Marginal);
        assert_eq!(label_for(0.05), FitLabel::Marginal);
        assert_eq!(label_for(0.0499), FitLabel::Poor);
        assert_eq!(label_for(0.0), FitLabel::Poor);
    }

    #[test]
    fn label_severity_never_increases_with_p() {
        let mut prev = label_for(0.0);
        for i in 0..=1000 {
            let label = label_for(i as f64 / 1000.0);
            assert!(label <= prev, "p={} gave {label:?} after {prev:?}", i as f64 / 1000.0);
            prev = label;
        }
    }

    #[test]
    fn decision_threshold_is_exact() {
        assert_eq!(decision_for(0.05), Decision::Accept);
        assert_eq!(decision_for(0.049_999_999), Decision::Reject);
        assert_eq!(decision_for(0.9), Decision::Accept);
    }

    #[test]
    fn notation_depends_on_name_only() {
        assert_eq!(notation_for("Exponential"), QueueNotation::M);
        assert_eq!(notation_for("gamma"), QueueNotation::G);
        assert_eq!(notation_for("Lognormal"), QueueNotation::G);
        assert_eq!(notation_for("Weibull"), QueueNotation::G);
        assert_eq!(notation_for("NORMAL"), QueueNotation::N);
        assert_eq!(notation_for("Uniform"), QueueNotation::D);
        assert_eq!(notation_for(""), QueueNotation::D);
    }

    #[test]
    fn table_is_grouped_by_variable_in_candidate_order() {
        let evals = [
            eval(Variable::Arrivals, [Some(0.95), Some(0.01), None, Some(0.3)]),
            eval(Variable::Service, [Some(0.04), Some(0.6), Some(0.2), None]),
        ];
        let table = build_decision_table(&evals);
        assert_eq!(table.len(), 8);

        let order: Vec<_> = table.iter().map(|r| (r.variable, r.distribution)).collect();
        assert_eq!(order[0], (Variable::Arrivals, DistributionKind::Exponential));
        assert_eq!(order[3], (Variable::Arrivals, DistributionKind::Gamma));
        assert_eq!(order[4], (Variable::Service, DistributionKind::Exponential));

        assert_eq!(table[0].label, FitLabel::Excellent);
        assert_eq!(table[0].notation, QueueNotation::M);
        assert_eq!(table[1].decision, Decision::Reject);
        assert_eq!(table[2].label, FitLabel::Undefined);
        assert_eq!(table[2].decision, Decision::Undefined);
        assert_eq!(table[2].ks_p_value, None);
        assert_eq!(table[4].decision, Decision::Reject);
        assert_eq!(table[5].label, FitLabel::Good);
        assert_eq!(table[5].notation, QueueNotation::N);
    }

    #[test]
    fn kendall_model_from_recommendations() {
        let arrivals = eval(Variable::Arrivals, [Some(0.95), Some(0.01), None, Some(0.3)]);
        let service = eval(Variable::Service, [Some(0.04), Some(0.1), Some(0.2), Some(0.7)]);

        let a = recommendation(&arrivals).unwrap();
        let s = recommendation(&service).unwrap();
        assert_eq!(a.distribution, DistributionKind::Exponential);
        assert_eq!(s.distribution, DistributionKind::Gamma);
        assert_eq!(kendall_model(Some(&a), Some(&s)), "M/G/1");
        assert_eq!(kendall_model(Some(&a), None), "M/D/1");
    }
}
