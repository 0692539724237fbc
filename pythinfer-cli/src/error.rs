use colored::Colorize;
use std::fmt;

use pythinfer_pipeline::PipelineError;
use pythinfer_sparql::SparqlError;

/// Exit codes for the CLI.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;
/// Fixpoint not reached within the round bound; artifacts were still
/// exported from the partial closure.
pub const EXIT_BOUND_EXCEEDED: i32 = 3;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Error from the pipeline (config, parse, backend, store, cancel).
    Pipeline(PipelineError),
    /// A user query failed to parse or evaluate.
    Query(SparqlError),
    /// `create` found no RDF files to put in a project.
    NothingFound,
    /// A config file already exists where `create` would write one.
    AlreadyExists(std::path::PathBuf),
    /// Argument / usage errors.
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Pipeline(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Query(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::NothingFound => write!(
                f,
                "{} no RDF files found to build a project from",
                "error:".red().bold(),
            ),
            CliError::AlreadyExists(path) => write!(
                f,
                "{} {} already exists\n  {} edit it, or delete it to re-create",
                "error:".red().bold(),
                path.display(),
                "help:".cyan().bold(),
            ),
            CliError::Usage(msg) => write!(f, "{} {msg}", "error:".red().bold()),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<SparqlError> for CliError {
    fn from(e: SparqlError) -> Self {
        CliError::Query(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Usage(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
