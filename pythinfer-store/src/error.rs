//! Store and view error types.

use oxrdf::GraphName;
use thiserror::Error;

use crate::store::Category;

/// Errors raised by the quad store and restricted views.
///
/// `PermissionDenied` and `ReadOnly` indicate an internal wiring bug in the
/// pipeline (a stage touching a graph outside its view) and are treated as
/// fatal by callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access to a graph outside a view's whitelist.
    #[error("graph {graph} is not visible in this view")]
    PermissionDenied {
        /// The graph that was addressed.
        graph: GraphName,
    },

    /// Mutation attempted through a read-only view.
    #[error("cannot {operation} through a read-only view (graph {graph})")]
    ReadOnly {
        /// The mutating operation that was attempted.
        operation: &'static str,
        /// The graph that was addressed.
        graph: GraphName,
    },

    /// A graph was re-registered under a different category.
    ///
    /// Categories are write-once: once a graph is created as `reference`,
    /// `local`, or `derived` it stays that way for the life of the store.
    #[error("graph {graph} is already registered as {existing}, cannot re-register as {requested}")]
    CategoryConflict {
        graph: GraphName,
        existing: Category,
        requested: Category,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
