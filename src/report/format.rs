//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{CandidateEvaluation, DecisionRecord, FittedParams, SummaryStats, Variable};
use crate::io::ingest::IngestedData;
use crate::report::decision::{kendall_model, recommendation};

/// Format the run header: source and cleaning counts.
pub fn format_ingest_summary(ingest: &IngestedData) -> String {
    let mut out = String::new();

    out.push_str("=== qfit - Queueing Distribution Fit ===\n");
    out.push_str(&format!("Input: {}\n", ingest.source.display()));
    out.push_str(&format!(
        "Rows: read={} | kept={} | dropped missing={} | dropped non-positive={}\n",
        ingest.stats.rows_read,
        ingest.stats.rows_kept,
        ingest.stats.dropped_missing,
        ingest.stats.dropped_nonpositive,
    ));
    if let Some(first) = ingest.row_errors.first() {
        out.push_str(&format!(
            "Unreadable rows: {} (first at line {}: {})\n",
            ingest.row_errors.len(),
            first.line,
            truncate(&first.message, 60)
        ));
    }
    if !ingest.suspect_rows.is_empty() {
        out.push_str(&format!(
            "Suspect rows (value <= 0): {}\n",
            ingest.suspect_rows.len()
        ));
    }
    out.push('\n');

    out
}

/// Format the descriptive statistics table, one row per variable.
pub fn format_summary_table(rows: &[(Variable, SummaryStats)]) -> String {
    let mut out = String::new();
    out.push_str("Descriptive statistics:\n");
    push_line(
        &mut out,
        format!(
            "{:<10} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8}",
            "variable", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "skew", "kurt"
        ),
    );
    push_line(&mut out, rule(&[10, 6, 10, 10, 10, 10, 10, 10, 10, 8, 8]));

    for (variable, s) in rows {
        push_line(
            &mut out,
            format!(
                "{:<10} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.3} {:>8.3}",
                variable.label(),
                s.count,
                s.mean,
                s.std_dev,
                s.min,
                s.q1,
                s.median,
                s.q3,
                s.max,
                s.skewness,
                s.kurtosis,
            ),
        );
    }
    out.push('\n');

    out
}

/// Format fitted parameters and scores for every candidate.
pub fn format_fit_details(evaluations: &[CandidateEvaluation]) -> String {
    let mut out = String::new();

    for eval in evaluations {
        out.push_str(&format!("{} fits:\n", eval.variable.title()));
        for r in &eval.records {
            let chosen = if eval.best == Some(r.distribution) { "*" } else { " " };
            match (&r.params, r.ks_statistic, r.ks_p_value) {
                (Some(params), Some(d), Some(p)) => {
                    push_line(
                        &mut out,
                        format!(
                            "{chosen} {:<12} D={d:.4} p={p:.4} A2={} {}",
                            r.distribution.name(),
                            fmt_opt(r.ad_statistic, 4),
                            fmt_params(params),
                        ),
                    );
                }
                _ => {
                    push_line(
                        &mut out,
                        format!(
                            "  (undefined {}) {}",
                            r.distribution.name(),
                            truncate(r.failure.as_deref().unwrap_or("not fitted"), 60)
                        ),
                    );
                }
            }
        }
        out.push('\n');
    }

    out
}

/// Format the decision table as exported.
pub fn format_decision_table(rows: &[DecisionRecord]) -> String {
    let mut out = String::new();
    out.push_str("Goodness-of-fit decision table:\n");
    push_line(
        &mut out,
        format!(
            "{:<10} {:<12} {:>10} {:>10} {:<11} {:<9} {:<8}",
            "variable", "distribution", "ks_p", "ad_stat", "label", "decision", "notation"
        ),
    );
    push_line(&mut out, rule(&[10, 12, 10, 10, 11, 9, 8]));

    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<10} {:<12} {:>10} {:>10} {:<11} {:<9} {:<8}",
                r.variable.label(),
                r.distribution.name(),
                fmt_opt(r.ks_p_value, 4),
                fmt_opt(r.ad_statistic, 4),
                r.label.as_str(),
                r.decision.as_str(),
                r.notation.letter(),
            ),
        );
    }
    out.push('\n');

    out
}

/// Format the per-variable recommendation lines and the queue model string.
pub fn format_recommendations(evaluations: &[CandidateEvaluation]) -> String {
    let mut out = String::new();
    out.push_str("Recommendation:\n");

    let mut arrivals = None;
    let mut service = None;
    for eval in evaluations {
        let rec = recommendation(eval);
        match &rec {
            Some(r) => out.push_str(&format!(
                "- {}: {} (p={:.4}) -> {}\n",
                eval.variable.label(),
                r.distribution.name(),
                r.p_value,
                r.notation.letter()
            )),
            None => out.push_str(&format!(
                "- {}: no candidate could be fitted\n",
                eval.variable.label()
            )),
        }
        match eval.variable {
            Variable::Arrivals => arrivals = rec,
            Variable::Service => service = rec,
        }
    }
    out.push_str(&format!(
        "- Queue model: {}\n",
        kendall_model(arrivals.as_ref(), service.as_ref())
    ));

    out
}

fn fmt_params(params: &FittedParams) -> String {
    match *params {
        FittedParams::Exponential { loc, scale } => format!("loc={loc:.4} scale={scale:.4}"),
        FittedParams::Normal { mean, std_dev } => format!("mean={mean:.4} sd={std_dev:.4}"),
        FittedParams::Lognormal { shape, loc, scale } => {
            format!("s={shape:.4} loc={loc:.4} scale={scale:.4}")
        }
        FittedParams::Gamma { shape, loc, scale } => {
            format!("a={shape:.4} loc={loc:.4} scale={scale:.4}")
        }
    }
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

fn rule(widths: &[usize]) -> String {
    widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join(" ")
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, DistributionKind, FitLabel, FitRecord, QueueNotation};

    fn evaluation() -> CandidateEvaluation {
        CandidateEvaluation {
            variable: Variable::Arrivals,
            records: vec![
                FitRecord {
                    distribution: DistributionKind::Exponential,
                    params: Some(FittedParams::Exponential { loc: 0.1, scale: 2.0 }),
                    ks_statistic: Some(0.05),
                    ks_p_value: Some(0.8),
                    ad_statistic: Some(0.4),
                    failure: None,
                },
                FitRecord::undefined(DistributionKind::Normal, "zero variance"),
            ],
            best: Some(DistributionKind::Exponential),
        }
    }

    #[test]
    fn fit_details_mark_best_and_undefined() {
        let text = format_fit_details(&[evaluation()]);
        assert!(text.contains("* Exponential"));
        assert!(text.contains("loc=0.1000 scale=2.0000"));
        assert!(text.contains("(undefined Normal) zero variance"));
    }

    #[test]
    fn decision_table_prints_dash_for_missing_values() {
        let rows = vec![DecisionRecord {
            variable: Variable::Service,
            distribution: DistributionKind::Gamma,
            ks_p_value: None,
            ad_statistic: None,
            label: FitLabel::Undefined,
            decision: Decision::Undefined,
            notation: QueueNotation::G,
        }];
        let text = format_decision_table(&rows);
        let last = text.lines().nth(3).unwrap();
        assert!(last.starts_with("Service"));
        assert!(last.contains(" - "));
        assert!(last.ends_with("Undefined G"));
    }

    #[test]
    fn recommendations_include_queue_model() {
        let service = CandidateEvaluation {
            variable: Variable::Service,
            records: vec![FitRecord::undefined(DistributionKind::Gamma, "x")],
            best: None,
        };
        let text = format_recommendations(&[evaluation(), service]);
        assert!(text.contains("- Arrivals: Exponential (p=0.8000) -> M"));
        assert!(text.contains("- Service: no candidate could be fitted"));
        assert!(text.contains("- Queue model: M/D/1"));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }
}
