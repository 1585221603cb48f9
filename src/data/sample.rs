//! Synthetic observation sample: exponential inter-arrival times and gamma
//! service times.
//!
//! The generator is seeded so the same settings always produce the same file.
//! With `dirty` set, a few rows are corrupted the way hand-collected data
//! usually is (blank cells, text, zero or negative gaps) so the cleaning pass
//! has something to do.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Gamma};
use tracing::info;

use crate::error::AppError;

/// Every `DIRTY_EVERY`-th row is corrupted when `dirty` is set.
const DIRTY_EVERY: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    /// Arrival rate `λ`; inter-arrival times have mean `1 / λ`.
    pub arrival_rate: f64,
    pub service_shape: f64,
    pub service_scale: f64,
    pub dirty: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 200,
            seed: 42,
            arrival_rate: 0.5,
            service_shape: 2.0,
            service_scale: 0.8,
            dirty: false,
        }
    }
}

/// One generated row. `None` is written as an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub arrivals: Option<String>,
    pub service: Option<String>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<Vec<SampleRow>, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    let arrivals = Exp::new(config.arrival_rate)
        .map_err(|e| AppError::new(2, format!("Invalid arrival rate: {e}")))?;
    let service = Gamma::new(config.service_shape, config.service_scale)
        .map_err(|e| AppError::new(2, format!("Invalid service distribution: {e}")))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut rows = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let a: f64 = arrivals.sample(&mut rng);
        let s: f64 = service.sample(&mut rng);
        let mut row = SampleRow {
            arrivals: Some(format!("{a:.4}")),
            service: Some(format!("{s:.4}")),
        };
        if config.dirty && (i + 1) % DIRTY_EVERY == 0 {
            corrupt(&mut row, (i + 1) / DIRTY_EVERY);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn corrupt(row: &mut SampleRow, k: usize) {
    match k % 4 {
        0 => row.arrivals = None,
        1 => row.service = Some("n/a".to_string()),
        2 => row.arrivals = Some("0".to_string()),
        _ => row.arrivals = Some("-1.0".to_string()),
    }
}

/// Generate a sample and write it as a two-column CSV.
pub fn write_sample_csv(path: &Path, config: &SampleConfig) -> Result<usize, AppError> {
    let rows = generate_sample(config)?;

    let write_err = |e: csv::Error| {
        AppError::new(2, format!("Failed to write sample CSV '{}': {e}", path.display()))
    };
    let mut wtr = csv::Writer::from_path(path).map_err(write_err)?;
    wtr.write_record(["arrivals", "service"]).map_err(write_err)?;
    for row in &rows {
        wtr.write_record([
            row.arrivals.as_deref().unwrap_or(""),
            row.service.as_deref().unwrap_or(""),
        ])
        .map_err(write_err)?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;

    info!(path = %path.display(), rows = rows.len(), seed = config.seed, "wrote sample");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisConfig;
    use crate::io::ingest::load_observations;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig::default();
        assert_eq!(generate_sample(&config).unwrap(), generate_sample(&config).unwrap());

        let other = SampleConfig { seed: 43, ..config.clone() };
        assert_ne!(generate_sample(&config).unwrap(), generate_sample(&other).unwrap());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let zero = SampleConfig { count: 0, ..SampleConfig::default() };
        assert_eq!(generate_sample(&zero).unwrap_err().exit_code(), 2);

        let bad_rate = SampleConfig { arrival_rate: -1.0, ..SampleConfig::default() };
        assert!(generate_sample(&bad_rate).is_err());
    }

    #[test]
    fn dirty_sample_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv");
        let config = SampleConfig {
            count: 100,
            dirty: true,
            ..SampleConfig::default()
        };
        assert_eq!(write_sample_csv(&path, &config).unwrap(), 100);

        let data = load_observations(&AnalysisConfig {
            input: path,
            ..AnalysisConfig::default()
        })
        .unwrap();
        // Rows 25, 50, 75, 100 are corrupted: text service, zero, negative, blank.
        assert_eq!(data.stats.rows_read, 100);
        assert_eq!(data.stats.dropped_missing, 2);
        assert!(data.stats.dropped_nonpositive >= 2);
        assert_eq!(data.stats.rows_kept, 98 - data.stats.dropped_nonpositive);
        assert!(data.arrivals.iter().all(|a| *a > 0.0));
    }
}
