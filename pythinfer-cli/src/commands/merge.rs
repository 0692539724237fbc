//! `pythinfer merge`: run the merger and export the `merged` artifact.

use std::path::Path;

use pythinfer_pipeline::run_merge;

use crate::commands::resolve_project;
use crate::error::CliResult;

pub fn run(config: Option<&Path>, no_create: bool) -> CliResult<()> {
    let project = resolve_project(config, no_create)?;
    let (outcome, written) = run_merge(&project)?;
    println!(
        "merged {} files ({} triples) from project '{}'",
        outcome.files_loaded, outcome.triples_loaded, project.name
    );
    for path in written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}
