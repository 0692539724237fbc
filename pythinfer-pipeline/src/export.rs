//! The exporter: materialize artifact quad sets to files.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use oxrdf::{Quad, Triple};
use oxrdfio::{RdfFormat, RdfSerializer};
use rustc_hash::FxHashSet;
use tracing::info;

use crate::error::{PipelineError, Result};

/// The four logical artifacts, exported as one file per (artifact, format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// All inputs, reference and local, as merged.
    Merged,
    /// Local inputs plus all retained entailments.
    CombinedFull,
    /// Same selection as `CombinedFull`, before filtering.
    CombinedInternal,
    /// The filtered, exportable result.
    CombinedWanted,
}

impl Artifact {
    pub fn file_stem(self) -> &'static str {
        match self {
            Artifact::Merged => "merged",
            Artifact::CombinedFull => "combined_full",
            Artifact::CombinedInternal => "combined_internal",
            Artifact::CombinedWanted => "combined_wanted",
        }
    }
}

/// The quad-preserving format every artifact is always written in; it
/// doubles as the cache format.
pub const QUAD_FORMAT: RdfFormat = RdfFormat::TriG;

/// Resolve a configured extra-format string ("ttl", "nt", ...).
pub fn resolve_format(spec: &str) -> Result<RdfFormat> {
    RdfFormat::from_extension(spec)
        .or_else(|| RdfFormat::from_media_type(spec))
        .ok_or_else(|| {
            PipelineError::Config(format!(
                "unknown export format '{spec}' (try one of: ttl, nt, nq, trig, rdf)"
            ))
        })
}

/// Write one artifact in one format.
///
/// Quads are sorted before serialization so repeated runs produce identical
/// bytes. Formats without dataset support flatten by discarding graph names
/// (deduplicating the triples that provenance kept apart).
pub fn export_artifact(
    quads: &[Quad],
    artifact: Artifact,
    folder: &Path,
    format: RdfFormat,
) -> Result<PathBuf> {
    std::fs::create_dir_all(folder).map_err(|e| PipelineError::io(folder, e))?;
    let path = folder.join(format!(
        "{}.{}",
        artifact.file_stem(),
        format.file_extension()
    ));
    let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
    let mut serializer = RdfSerializer::from_format(format).for_writer(BufWriter::new(file));

    if format.supports_datasets() {
        let mut sorted: Vec<&Quad> = quads.iter().collect();
        sorted.sort_by_cached_key(|q| {
            (
                q.graph_name.to_string(),
                q.subject.to_string(),
                q.predicate.to_string(),
                q.object.to_string(),
            )
        });
        for quad in sorted {
            serializer
                .serialize_quad(quad)
                .map_err(|e| PipelineError::io(&path, e))?;
        }
    } else {
        let distinct: FxHashSet<Triple> = quads
            .iter()
            .map(|q| Triple::new(q.subject.clone(), q.predicate.clone(), q.object.clone()))
            .collect();
        let mut sorted: Vec<Triple> = distinct.into_iter().collect();
        sorted.sort_by_cached_key(|t| {
            (
                t.subject.to_string(),
                t.predicate.to_string(),
                t.object.to_string(),
            )
        });
        for triple in &sorted {
            serializer
                .serialize_triple(triple)
                .map_err(|e| PipelineError::io(&path, e))?;
        }
    }

    serializer
        .finish()
        .map_err(|e| PipelineError::io(&path, e))?
        .into_inner()
        .map_err(|e| PipelineError::io(&path, e.into_error()))?;
    info!(artifact = artifact.file_stem(), path = %path.display(), "exported");
    Ok(path)
}
