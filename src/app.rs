//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the analysis pipeline
//! - prints reports/plots
//! - writes the exported tables

use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, InputArgs, SampleArgs};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `qfit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; clap falls back to its defaults.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Describe(args) => handle_describe(&args),
        Command::Tui(args) => handle_tui(&args),
        Command::Sample(args) => handle_sample(&args),
    }
}

/// Logs go to stderr; `RUST_LOG` directives take precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_ingest_summary(&run.ingest));
    println!("{}", crate::report::format_summary_table(&run.summaries));

    if config.plot {
        for plots in run.plots() {
            println!(
                "{}",
                crate::plot::render_variable_plots(&plots, config.plot_width, config.plot_height)
            );
        }
    }

    println!("{}", crate::report::format_fit_details(&run.evaluations));
    println!("{}", crate::report::format_decision_table(&run.decisions));
    println!("{}", crate::report::format_recommendations(&run.evaluations));

    let paths = pipeline::export_results(&run, &config)?;
    println!("Decision table: {}", paths.decision_table.display());
    println!("Summary statistics: {}", paths.summary.display());
    if let Some(json) = &paths.json {
        println!("Fit results (JSON): {}", json.display());
    }
    info!("analysis complete");

    Ok(())
}

fn handle_describe(args: &InputArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let ingest = crate::io::load_observations(&config)?;
    let summaries = pipeline::describe_all(&ingest);

    println!("{}", crate::report::format_ingest_summary(&ingest));
    print!("{}", crate::report::format_summary_table(&summaries));
    Ok(())
}

fn handle_tui(args: &InputArgs) -> Result<(), AppError> {
    crate::tui::run(args.to_config())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let rows = crate::data::write_sample_csv(&args.output, &args.to_config())?;
    println!("Wrote {rows} rows to {}", args.output.display());
    Ok(())
}

/// `qfit` and `qfit <flags>` run `analyze`; subcommands, help and version pass through.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let default_to_analyze = match argv.get(1).map(String::as_str) {
        None => true,
        Some("-h" | "--help" | "-V" | "--version") => false,
        Some(first) => first.starts_with('-'),
    };
    if default_to_analyze {
        argv.insert(1, "analyze".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_analyze() {
        assert_eq!(rewrite_args(args(&["qfit"])), args(&["qfit", "analyze"]));
    }

    #[test]
    fn leading_flags_are_analyze_flags() {
        assert_eq!(
            rewrite_args(args(&["qfit", "-v", "-i", "obs.csv"])),
            args(&["qfit", "analyze", "-v", "-i", "obs.csv"])
        );
        let cli = crate::cli::Cli::parse_from(rewrite_args(args(&["qfit", "--strict"])));
        assert!(matches!(cli.command, Command::Analyze(a) if a.input.strict));
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for argv in [
            args(&["qfit", "tui", "-i", "x.csv"]),
            args(&["qfit", "sample", "--dirty"]),
            args(&["qfit", "describe"]),
            args(&["qfit", "--help"]),
            args(&["qfit", "-V"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }
}
