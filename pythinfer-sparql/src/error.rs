//! SPARQL parsing and evaluation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SparqlError {
    /// The query text is not valid SPARQL.
    #[error("syntax error in query '{name}': {source}")]
    Syntax {
        name: String,
        #[source]
        source: spargebra::SparqlSyntaxError,
    },

    /// The query uses an algebra construct the heuristic evaluator does not
    /// implement. Raised at load time so the offending query is named
    /// before any inference runs.
    #[error("query '{name}' uses unsupported construct {construct}")]
    Unsupported { name: String, construct: String },

    /// The query form does not match the call site (e.g. a SELECT handed to
    /// the CONSTRUCT runner).
    #[error("query '{name}' is a {found} query, expected {expected}")]
    WrongForm {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SparqlError>;
