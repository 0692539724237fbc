//! End-to-end orchestration: merge, reason to fixpoint, filter, export.

use std::path::PathBuf;
use std::str::FromStr;

use oxrdf::{GraphName, Quad};
use oxrdfio::RdfFormat;
use pythinfer_reasoner::BackendKind;
use pythinfer_store::{Category, QuadStore};
use pythinfer_vocab::graphs;
use tracing::info;

use crate::cache::load_cached_combined_full;
use crate::driver::{run_to_fixpoint, CancelToken, DriverReport};
use crate::error::Result;
use crate::export::{export_artifact, resolve_format, Artifact, QUAD_FORMAT};
use crate::filter::{apply_filter_chain, FilterStats};
use crate::heuristics::{load_heuristics, ProceduralRegistry};
use crate::merge::{merge_project, MergeOutcome};
use crate::project::Project;

/// Everything a full pipeline run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub driver: DriverReport,
    pub filter: FilterStats,
    pub written: Vec<PathBuf>,
    /// The filtered, exportable quad set (`combined_wanted`).
    pub wanted: Vec<Quad>,
}

/// The formats to export: the mandatory quad format plus configured extras.
fn export_formats(project: &Project) -> Result<Vec<RdfFormat>> {
    let mut formats = vec![QUAD_FORMAT];
    for spec in &project.extra_formats {
        let format = resolve_format(spec)?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Quads of the merged artifact: every input graph, reference and local.
pub fn merged_quads(store: &QuadStore) -> Vec<Quad> {
    let mut quads = Vec::new();
    for category in [Category::Reference, Category::Local] {
        for graph in store.graphs_in_category(category) {
            quads.extend(
                store
                    .graph_triples(&graph)
                    .map(|t| Quad::new(t.subject.clone(), t.predicate.clone(), t.object.clone(), graph.clone())),
            );
        }
    }
    quads
}

/// Quads of the combined artifacts: local inputs plus retained entailments.
/// Reference graphs and the reference-only entailment graph are excluded,
/// which is what keeps vocabulary noise out of every export.
pub fn combined_quads(store: &QuadStore) -> Vec<Quad> {
    let mut selection: Vec<GraphName> = store.graphs_in_category(Category::Local);
    selection.push(GraphName::from(graphs::INFERENCES_FULL_OWL));
    selection.push(GraphName::from(graphs::INFERENCES_HEURISTIC));

    let mut quads = Vec::new();
    for graph in selection {
        quads.extend(
            store
                .graph_triples(&graph)
                .map(|t| Quad::new(t.subject.clone(), t.predicate.clone(), t.object.clone(), graph.clone())),
        );
    }
    quads
}

/// Run the merger alone and export the `merged` artifact.
pub fn run_merge(project: &Project) -> Result<(MergeOutcome, Vec<PathBuf>)> {
    let mut store = QuadStore::new();
    let outcome = merge_project(&mut store, project)?;
    let quads = merged_quads(&store);
    let mut written = Vec::new();
    for format in export_formats(project)? {
        written.push(export_artifact(
            &quads,
            Artifact::Merged,
            &project.output_folder,
            format,
        )?);
    }
    Ok((outcome, written))
}

/// Run the whole pipeline and export all four artifacts.
pub fn run_pipeline(
    project: &Project,
    registry: &ProceduralRegistry,
    cancel: &CancelToken,
) -> Result<PipelineReport> {
    let backend_kind = BackendKind::from_str(&project.backend)?;
    let backend = backend_kind.instantiate();
    let heuristics = load_heuristics(project, registry)?;
    let formats = export_formats(project)?;

    let mut store = QuadStore::new();
    let merge = merge_project(&mut store, project)?;

    let driver = run_to_fixpoint(
        &mut store,
        &merge,
        backend.as_ref(),
        &heuristics,
        project.iteration_bound,
        cancel,
    )?;

    let merged = merged_quads(&store);
    let combined = combined_quads(&store);
    let (wanted, filter) = apply_filter_chain(combined.clone());

    let mut written = Vec::new();
    for format in &formats {
        written.push(export_artifact(&merged, Artifact::Merged, &project.output_folder, *format)?);
        written.push(export_artifact(
            &combined,
            Artifact::CombinedFull,
            &project.output_folder,
            *format,
        )?);
        written.push(export_artifact(
            &combined,
            Artifact::CombinedInternal,
            &project.output_folder,
            *format,
        )?);
        written.push(export_artifact(
            &wanted,
            Artifact::CombinedWanted,
            &project.output_folder,
            *format,
        )?);
    }

    info!(
        project = %project.name,
        rounds = driver.rounds,
        wanted = wanted.len(),
        files = written.len(),
        "pipeline complete"
    );

    Ok(PipelineReport {
        driver,
        filter,
        written,
        wanted,
    })
}

/// The `combined_wanted` quad set, from a fresh cache when possible,
/// otherwise from a full pipeline run.
///
/// Returns the report too when a run actually happened, so callers can
/// surface bound-exceeded warnings.
pub fn wanted_quads(
    project: &Project,
    registry: &ProceduralRegistry,
    cancel: &CancelToken,
) -> Result<(Vec<Quad>, Option<PipelineReport>)> {
    if let Some(store) = load_cached_combined_full(project)? {
        info!("using cached inference results");
        let (wanted, _) = apply_filter_chain(store.iter().collect());
        return Ok((wanted, None));
    }
    let report = run_pipeline(project, registry, cancel)?;
    let wanted = report.wanted.clone();
    Ok((wanted, Some(report)))
}
