//! CSV ingest and cleaning.
//!
//! This module turns an observation CSV into two row-aligned sequences
//! (inter-arrival times and service times) that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for the two required columns (clear errors + exit code 2)
//! - **Row-level cleaning** (drop bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{AnalysisConfig, Variable};
use crate::error::AppError;

/// Accepted alternative header names, keyed by the canonical name.
const HEADER_ALIASES: [(&str, &str); 2] = [("arrivals", "llegadas"), ("service", "servicio")];

/// Row counts from the cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows where either column was empty, unparseable or non-finite.
    pub dropped_missing: usize,
    /// Rows removed by the positivity filter.
    pub dropped_nonpositive: usize,
}

/// A row with a non-positive value in either column, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspectRow {
    pub line: usize,
    pub arrivals: f64,
    pub service: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: cleaned sequences + counts + diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: PathBuf,
    pub arrivals: Vec<f64>,
    pub service: Vec<f64>,
    pub stats: IngestStats,
    pub suspect_rows: Vec<SuspectRow>,
    pub row_errors: Vec<RowError>,
}

impl IngestedData {
    pub fn values(&self, variable: Variable) -> &[f64] {
        match variable {
            Variable::Arrivals => &self.arrivals,
            Variable::Service => &self.service,
        }
    }
}

/// Load the observation CSV and clean it.
///
/// Rows missing either value are dropped, then rows with arrivals `<= 0`
/// (and, in strict mode, service `<= 0`). The surviving rows stay aligned.
pub fn load_observations(config: &AnalysisConfig) -> Result<IngestedData, AppError> {
    let file = File::open(&config.input).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", config.input.display()),
        )
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let arrivals_idx = resolve_column(&header_map, &config.arrivals_column)?;
    let service_idx = resolve_column(&header_map, &config.service_column)?;

    let mut arrivals = Vec::new();
    let mut service = Vec::new();
    let mut stats = IngestStats::default();
    let mut suspect_rows = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        stats.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                stats.dropped_missing += 1;
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let (Some(a), Some(s)) = (cell_value(&record, arrivals_idx), cell_value(&record, service_idx))
        else {
            stats.dropped_missing += 1;
            continue;
        };

        if a <= 0.0 || s <= 0.0 {
            suspect_rows.push(SuspectRow {
                line,
                arrivals: a,
                service: s,
            });
        }

        if a <= 0.0 || (config.strict && s <= 0.0) {
            stats.dropped_nonpositive += 1;
            continue;
        }

        arrivals.push(a);
        service.push(s);
    }

    stats.rows_kept = arrivals.len();

    for row in &suspect_rows {
        warn!(
            line = row.line,
            arrivals = row.arrivals,
            service = row.service,
            "suspect row: non-positive value"
        );
    }
    if stats.dropped_missing > 0 {
        warn!(rows = stats.dropped_missing, "dropped rows with missing values");
    }
    if stats.dropped_nonpositive > 0 {
        warn!(rows = stats.dropped_nonpositive, "dropped rows with non-positive values");
    }

    if stats.rows_kept == 0 {
        return Err(AppError::new(
            3,
            "No valid rows remain after cleaning.",
        ));
    }

    info!(
        input = %config.input.display(),
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept,
        "observations loaded"
    );

    Ok(IngestedData {
        source: config.input.clone(),
        arrivals,
        service,
        stats,
        suspect_rows,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins on duplicate headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim_start_matches('\u{feff}').trim();
    name.to_lowercase()
}

fn resolve_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    let wanted = normalize_header_name(name);
    if let Some(idx) = header_map.get(&wanted) {
        return Ok(*idx);
    }

    let alias = HEADER_ALIASES
        .iter()
        .find_map(|&(canonical, alias)| (canonical == wanted).then_some(alias));
    if let Some(idx) = alias.and_then(|a| header_map.get(a)) {
        return Ok(*idx);
    }

    let mut found: Vec<&str> = header_map.keys().map(String::as_str).collect();
    found.sort_unstable();
    Err(AppError::new(
        2,
        format!(
            "Missing required column: `{name}` (found: {})",
            found.join(", ")
        ),
    ))
}

/// Numeric cell value; empty, unparseable and non-finite cells are missing.
fn cell_value(record: &StringRecord, idx: usize) -> Option<f64> {
    let s = record.get(idx).map(str::trim).filter(|s| !s.is_empty())?;
    parse_number(s)
}

fn parse_number(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
