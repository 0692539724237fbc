//! Pipeline error taxonomy.
//!
//! Everything here is fatal to the run except what never becomes an error
//! at all: per-triple filter drops are counted, not raised, and a fixpoint
//! that hits its round bound is reported on the [`crate::driver::DriverReport`]
//! as a warning condition.

use std::path::PathBuf;

use pythinfer_reasoner::ReasonerError;
use pythinfer_sparql::SparqlError;
use pythinfer_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or unresolvable project configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An input file could not be read as RDF.
    #[error("cannot parse {path} as {format}: {message}")]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// Restricted-view violation; indicates an internal wiring bug.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The reasoner backend failed or is not available.
    #[error("inference backend error: {0}")]
    Backend(#[from] ReasonerError),

    /// A SPARQL heuristic could not be loaded or evaluated.
    #[error("heuristic error: {0}")]
    Heuristic(#[from] SparqlError),

    /// Cooperative cancellation; partial results are discarded.
    #[error("pipeline run cancelled")]
    Cancelled,

    /// Filesystem failure with the path that caused it.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
