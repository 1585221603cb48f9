//! Export the decision table, summary table and full fit results.
//!
//! The CSV files are meant to be easy to consume in spreadsheets. A destination
//! that is locked or not writable (typically the previous export still open in
//! a spreadsheet) is retried once under a timestamped name.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{CandidateEvaluation, DecisionRecord, SummaryStats, Variable};
use crate::error::AppError;

/// Timestamp format used in fallback file names.
pub const FALLBACK_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

#[derive(Serialize)]
struct DecisionRow<'a> {
    variable: &'a str,
    distribution: &'a str,
    ks_p_value: Option<f64>,
    ad_statistic: Option<f64>,
    label: &'a str,
    decision: &'a str,
    notation: &'a str,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    variable: &'a str,
    count: usize,
    mean: f64,
    std: f64,
    min: f64,
    #[serde(rename = "25%")]
    q1: f64,
    #[serde(rename = "50%")]
    median: f64,
    #[serde(rename = "75%")]
    q3: f64,
    max: f64,
    skewness: f64,
    kurtosis: f64,
}

#[derive(Serialize)]
struct FitExport<'a> {
    generated_at: String,
    input: String,
    evaluations: &'a [CandidateEvaluation],
    decisions: &'a [DecisionRecord],
}

/// Write the decision table; returns the path actually written.
pub fn write_decision_table_csv(path: &Path, rows: &[DecisionRecord]) -> Result<PathBuf, AppError> {
    write_with_fallback(path, Local::now().naive_local(), |target| {
        let mut wtr = csv::Writer::from_writer(File::create(target)?);
        for r in rows {
            wtr.serialize(DecisionRow {
                variable: r.variable.label(),
                distribution: r.distribution.name(),
                ks_p_value: r.ks_p_value,
                ad_statistic: r.ad_statistic,
                label: r.label.as_str(),
                decision: r.decision.as_str(),
                notation: r.notation.letter(),
            })?;
        }
        wtr.flush()
    })
}

/// Write the descriptive statistics table; returns the path actually written.
pub fn write_summary_csv(path: &Path, rows: &[(Variable, SummaryStats)]) -> Result<PathBuf, AppError> {
    write_with_fallback(path, Local::now().naive_local(), |target| {
        let mut wtr = csv::Writer::from_writer(File::create(target)?);
        for (variable, s) in rows {
            wtr.serialize(SummaryRow {
                variable: variable.label(),
                count: s.count,
                mean: s.mean,
                std: s.std_dev,
                min: s.min,
                q1: s.q1,
                median: s.median,
                q3: s.q3,
                max: s.max,
                skewness: s.skewness,
                kurtosis: s.kurtosis,
            })?;
        }
        wtr.flush()
    })
}

/// Write fitted parameters, scores and decisions as pretty JSON.
pub fn write_fit_json(
    path: &Path,
    input: &Path,
    evaluations: &[CandidateEvaluation],
    decisions: &[DecisionRecord],
) -> Result<PathBuf, AppError> {
    let now = Local::now();
    let export = FitExport {
        generated_at: now.to_rfc3339(),
        input: input.display().to_string(),
        evaluations,
        decisions,
    };
    write_with_fallback(path, now.naive_local(), |target| {
        let mut out = BufWriter::new(File::create(target)?);
        serde_json::to_writer_pretty(&mut out, &export)?;
        out.write_all(b"\n")?;
        out.flush()
    })
}

/// Run `write` against `path`; if the destination is locked or not writable,
/// retry once at the timestamped fallback path. Other errors are not retried.
pub fn write_with_fallback<F>(path: &Path, now: NaiveDateTime, mut write: F) -> Result<PathBuf, AppError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    match write(path) {
        Ok(()) => {
            info!(path = %path.display(), "wrote export");
            Ok(path.to_path_buf())
        }
        Err(e) if is_write_locked(&e) => {
            let fallback = fallback_path(path, now);
            warn!(
                path = %path.display(),
                fallback = %fallback.display(),
                "destination not writable, using fallback name"
            );
            write(&fallback).map_err(|e| {
                AppError::new(
                    2,
                    format!("Failed to write '{}': {e}", fallback.display()),
                )
            })?;
            Ok(fallback)
        }
        Err(e) => Err(AppError::new(
            2,
            format!("Failed to write '{}': {e}", path.display()),
        )),
    }
}

/// Windows `ERROR_SHARING_VIOLATION` and `ERROR_LOCK_VIOLATION`.
///
/// A file held open by a spreadsheet fails with these, and std does not map
/// them to `PermissionDenied`.
#[cfg(windows)]
const LOCKED_OS_ERRORS: [i32; 2] = [32, 33];

/// Whether a failed write should be retried under the fallback name.
pub fn is_write_locked(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    #[cfg(windows)]
    {
        if err.raw_os_error().is_some_and(|code| LOCKED_OS_ERRORS.contains(&code)) {
            return true;
        }
    }
    false
}

/// `<dir>/<stem>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn fallback_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let stamp = now.format(FALLBACK_TIMESTAMP);
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, DistributionKind, FitLabel, QueueNotation};
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    fn decision_rows() -> Vec<DecisionRecord> {
        vec![
            DecisionRecord {
                variable: Variable::Arrivals,
                distribution: DistributionKind::Exponential,
                ks_p_value: Some(0.5),
                ad_statistic: Some(0.25),
                label: FitLabel::Good,
                decision: Decision::Accept,
                notation: QueueNotation::M,
            },
            DecisionRecord {
                variable: Variable::Arrivals,
                distribution: DistributionKind::Gamma,
                ks_p_value: None,
                ad_statistic: None,
                label: FitLabel::Undefined,
                decision: Decision::Undefined,
                notation: QueueNotation::G,
            },
        ]
    }

    #[test]
    fn fallback_name_appends_timestamp_before_extension() {
        let p = fallback_path(Path::new("/tmp/out/goodness_of_fit.csv"), ts());
        assert_eq!(p, PathBuf::from("/tmp/out/goodness_of_fit_20240309_140507.csv"));

        let bare = fallback_path(Path::new("report"), ts());
        assert_eq!(bare, PathBuf::from("report_20240309_140507"));
    }

    #[test]
    fn permission_denied_retries_once_at_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("goodness_of_fit.csv");
        let mut attempts = Vec::new();

        let written = write_with_fallback(&target, ts(), |p| {
            attempts.push(p.to_path_buf());
            if attempts.len() == 1 {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            } else {
                std::fs::write(p, "ok")
            }
        })
        .unwrap();

        assert_eq!(written, dir.path().join("goodness_of_fit_20240309_140507.csv"));
        assert_eq!(attempts.len(), 2);
        assert!(written.exists());
        assert!(!target.exists());
    }

    #[test]
    fn locked_destinations_are_recognised() {
        assert!(is_write_locked(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_write_locked(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_write_locked(&io::Error::other("disk full")));
    }

    #[cfg(windows)]
    #[test]
    fn sharing_violation_retries_at_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("goodness_of_fit.csv");
        let mut calls = 0;

        let written = write_with_fallback(&target, ts(), |p| {
            calls += 1;
            if calls == 1 {
                Err(io::Error::from_raw_os_error(32))
            } else {
                std::fs::write(p, "ok")
            }
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(written, dir.path().join("goodness_of_fit_20240309_140507.csv"));
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let err = write_with_fallback(Path::new("x.csv"), ts(), |_| {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::NotFound))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn second_permission_failure_is_reported() {
        let err = write_with_fallback(Path::new("x.csv"), ts(), |_| {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        })
        .unwrap_err();
        assert!(err.message().contains("x_20240309_140507.csv"));
    }

    #[test]
    fn decision_table_csv_has_expected_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goodness_of_fit.csv");
        let written = write_decision_table_csv(&path, &decision_rows()).unwrap();
        assert_eq!(written, path);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "variable,distribution,ks_p_value,ad_statistic,label,decision,notation"
        );
        assert_eq!(lines[1], "Arrivals,Exponential,0.5,0.25,Good,Accept,M");
        assert_eq!(lines[2], "Arrivals,Gamma,,,Undefined,Undefined,G");
    }

    #[test]
    fn summary_csv_uses_percentile_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary_statistics.csv");
        let stats = crate::describe::describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        write_summary_csv(&path, &[(Variable::Service, stats)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "variable,count,mean,std,min,25%,50%,75%,max,skewness,kurtosis"
        );
        assert!(lines.next().unwrap().starts_with("Service,5,3.0,"));
    }

    #[test]
    fn fit_json_round_trips_decisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.json");
        write_fit_json(&path, Path::new("observations.csv"), &[], &decision_rows()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["input"], "observations.csv");
        assert_eq!(value["decisions"][0]["distribution"], "Exponential");
        assert_eq!(value["decisions"][1]["ks_p_value"], serde_json::Value::Null);
    }
}
