//! `pythinfer infer`: run the full pipeline and export all artifacts.

use std::path::Path;

use colored::Colorize;
use pythinfer_pipeline::{run_pipeline, CancelToken, DriverOutcome, ProceduralRegistry};

use crate::commands::resolve_project;
use crate::error::{CliResult, EXIT_BOUND_EXCEEDED, EXIT_SUCCESS};

/// Returns the process exit code: success, or the non-fatal
/// bound-exceeded marker.
pub fn run(config: Option<&Path>, no_create: bool) -> CliResult<i32> {
    let project = resolve_project(config, no_create)?;
    let registry = ProceduralRegistry::new();
    let report = run_pipeline(&project, &registry, &CancelToken::new())?;

    println!(
        "inference complete after {} round(s): {} entailed + {} heuristic triples, {} filtered out",
        report.driver.rounds,
        report.driver.full_entailments,
        report.driver.heuristic_entailments,
        report.filter.total_dropped(),
    );
    for path in &report.written {
        println!("  wrote {}", path.display());
    }

    if report.driver.outcome == DriverOutcome::BoundExceeded {
        eprintln!(
            "{} fixpoint not reached in {} rounds (last round added {} triples)",
            "warning:".yellow().bold(),
            report.driver.rounds,
            report.driver.final_round_delta,
        );
        return Ok(EXIT_BOUND_EXCEEDED);
    }
    Ok(EXIT_SUCCESS)
}
