//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load/clean -> describe -> fit/score -> decision table
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;

use tracing::info;

use crate::describe::describe;
use crate::domain::{AnalysisConfig, CandidateEvaluation, DecisionRecord, SummaryStats, Variable};
use crate::error::AppError;
use crate::fit::evaluate_candidates;
use crate::io::ingest::{IngestedData, load_observations};
use crate::plot::{VariablePlots, build_plots};
use crate::report::build_decision_table;

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub summaries: Vec<(Variable, SummaryStats)>,
    /// Arrivals first, then service.
    pub evaluations: Vec<CandidateEvaluation>,
    pub decisions: Vec<DecisionRecord>,
}

impl RunOutput {
    pub fn values(&self, variable: Variable) -> &[f64] {
        self.ingest.values(variable)
    }

    pub fn evaluation(&self, variable: Variable) -> Option<&CandidateEvaluation> {
        self.evaluations.iter().find(|e| e.variable == variable)
    }

    /// Plot series for every variable, in evaluation order.
    pub fn plots(&self) -> Vec<VariablePlots> {
        self.evaluations
            .iter()
            .map(|eval| build_plots(self.values(eval.variable), eval))
            .collect()
    }
}

/// Files written by [`export_results`] (after any fallback renaming).
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub decision_table: PathBuf,
    pub summary: PathBuf,
    pub json: Option<PathBuf>,
}

/// Load the observations and compute statistics, fits and the decision table.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    // 1) Load and clean.
    let ingest = load_observations(config)?;

    // 2) Describe.
    let summaries = describe_all(&ingest);

    // 3) Fit and score each variable independently.
    let evaluations: Vec<CandidateEvaluation> = Variable::ALL
        .iter()
        .map(|&variable| {
            let eval = evaluate_candidates(variable, ingest.values(variable));
            info!(
                variable = variable.label(),
                best = eval.best.map(|k| k.name()).unwrap_or("none"),
                "candidates evaluated"
            );
            eval
        })
        .collect();

    // 4) Decision table.
    let decisions = build_decision_table(&evaluations);

    Ok(RunOutput {
        ingest,
        summaries,
        evaluations,
        decisions,
    })
}

/// Descriptive statistics per variable (only the describe stage of the pipeline).
pub fn describe_all(ingest: &IngestedData) -> Vec<(Variable, SummaryStats)> {
    Variable::ALL
        .iter()
        .filter_map(|&variable| describe(ingest.values(variable)).map(|s| (variable, s)))
        .collect()
}

/// Write the decision table, the summary table and the optional JSON export.
pub fn export_results(run: &RunOutput, config: &AnalysisConfig) -> Result<ExportPaths, AppError> {
    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let decision_table = crate::io::export::write_decision_table_csv(
        &config.out_dir.join(&config.decision_file),
        &run.decisions,
    )?;
    let summary = crate::io::export::write_summary_csv(
        &config.out_dir.join(&config.summary_file),
        &run.summaries,
    )?;
    let json = match &config.export_json {
        Some(path) => Some(crate::io::export::write_fit_json(
            path,
            &run.ingest.source,
            &run.evaluations,
            &run.decisions,
        )?),
        None => None,
    };

    Ok(ExportPaths {
        decision_table,
        summary,
        json,
    })
}
