//! Command-line parsing for the queueing distribution fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the statistics code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::SampleConfig;
use crate::domain::{AnalysisConfig, DEFAULT_DECISION_FILE, DEFAULT_INPUT, DEFAULT_SUMMARY_FILE};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "qfit",
    version,
    about = "Distribution fitting for queueing studies (inter-arrival and service times)"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` also applies.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean the data, fit all candidates, print the decision table and export it.
    Analyze(AnalyzeArgs),
    /// Print descriptive statistics only.
    Describe(InputArgs),
    /// Browse the diagnostic plots and fit table interactively.
    ///
    /// This uses the same underlying pipeline as `qfit analyze`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(InputArgs),
    /// Write a synthetic observation CSV (exponential arrivals, gamma service).
    Sample(SampleArgs),
}

/// Where to read observations from.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Observation CSV.
    #[arg(short, long, env = "QFIT_INPUT", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Column holding inter-arrival times (case-insensitive).
    #[arg(long, env = "QFIT_ARRIVALS_COLUMN", default_value = "arrivals")]
    pub arrivals_column: String,

    /// Column holding service times (case-insensitive).
    #[arg(long, env = "QFIT_SERVICE_COLUMN", default_value = "service")]
    pub service_column: String,

    /// Also drop rows whose service time is not strictly positive.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for the exported tables.
    #[arg(short, long, env = "QFIT_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// File name of the decision table.
    #[arg(long, default_value = DEFAULT_DECISION_FILE)]
    pub decision_file: String,

    /// File name of the descriptive statistics table.
    #[arg(long, default_value = DEFAULT_SUMMARY_FILE)]
    pub summary_file: String,

    /// Also export the full fit results (parameters, statistics, decisions) as JSON.
    #[arg(long, value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Destination CSV.
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub output: PathBuf,

    /// Number of rows.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Arrival rate (inter-arrival mean is 1 / rate).
    #[arg(long, default_value_t = 0.5)]
    pub arrival_rate: f64,

    /// Gamma shape of service times.
    #[arg(long, default_value_t = 2.0)]
    pub service_shape: f64,

    /// Gamma scale of service times.
    #[arg(long, default_value_t = 0.8)]
    pub service_scale: f64,

    /// Corrupt a few rows (blank, text, zero, negative) to exercise cleaning.
    #[arg(long)]
    pub dirty: bool,
}

impl InputArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            input: self.input.clone(),
            arrivals_column: self.arrivals_column.clone(),
            service_column: self.service_column.clone(),
            strict: self.strict,
            ..AnalysisConfig::default()
        }
    }
}

impl AnalyzeArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            out_dir: self.out_dir.clone(),
            decision_file: self.decision_file.clone(),
            summary_file: self.summary_file.clone(),
            export_json: self.export_json.clone(),
            plot: !self.no_plot,
            plot_width: self.width,
            plot_height: self.height,
            ..self.input.to_config()
        }
    }
}

impl SampleArgs {
    pub fn to_config(&self) -> SampleConfig {
        SampleConfig {
            count: self.count,
            seed: self.seed,
            arrival_rate: self.arrival_rate,
            service_shape: self.service_shape,
            service_scale: self.service_scale,
            dirty: self.dirty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags_map_to_config() {
        let cli = Cli::parse_from([
            "qfit",
            "-vv",
            "analyze",
            "--input",
            "data/obs.csv",
            "--arrivals-column",
            "llegadas",
            "--strict",
            "--out-dir",
            "results",
            "--no-plot",
            "--export-json",
            "fits.json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let config = args.to_config();
        assert_eq!(config.input, PathBuf::from("data/obs.csv"));
        assert_eq!(config.arrivals_column, "llegadas");
        assert_eq!(config.service_column, "service");
        assert!(config.strict);
        assert!(!config.plot);
        assert_eq!(config.out_dir, PathBuf::from("results"));
        assert_eq!(config.decision_file, DEFAULT_DECISION_FILE);
        assert_eq!(config.export_json, Some(PathBuf::from("fits.json")));
    }

    #[test]
    fn sample_defaults() {
        let cli = Cli::parse_from(["qfit", "sample", "--dirty"]);
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        let config = args.to_config();
        assert_eq!(config, SampleConfig { dirty: true, ..SampleConfig::default() });
        assert_eq!(args.output, PathBuf::from(DEFAULT_INPUT));
    }
}
