//! The pythinfer inference pipeline.
//!
//! Merges categorized RDF inputs into a provenance-preserving quad store,
//! drives OWL-RL and configured heuristics to a fixed point, filters the
//! result, and exports the useful subset. See the crate modules in
//! dependency order:
//!
//! - [`project`] - `pythinfer.yaml` loading and discovery
//! - [`merge`] - per-file named graphs with categories
//! - [`heuristics`] - SPARQL CONSTRUCT and procedural rules
//! - [`driver`] - the fixed-point loop over reasoner and heuristics
//! - [`filter`] - per-triple and whole-graph unwanted-triple removal
//! - [`export`] - artifact serialization
//! - [`cache`] - freshness probe for the quad-format export
//! - [`pipeline`] - end-to-end orchestration

pub mod cache;
pub mod driver;
pub mod error;
pub mod export;
pub mod filter;
pub mod heuristics;
pub mod merge;
pub mod pipeline;
pub mod project;

pub use driver::{CancelToken, DriverOutcome, DriverReport};
pub use error::{PipelineError, Result};
pub use export::Artifact;
pub use heuristics::ProceduralRegistry;
pub use pipeline::{run_merge, run_pipeline, wanted_quads, PipelineReport};
pub use project::{discover_project, Project, PROJECT_FILE_NAME};
