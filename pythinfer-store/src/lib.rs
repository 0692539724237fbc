//! In-memory quad store for the pythinfer inference pipeline.
//!
//! The store keeps every triple inside exactly one named graph, remembers a
//! write-once [`Category`] per graph, and supports the set algebra the
//! pipeline needs (per-graph iteration, difference by triple, bulk insert).
//! [`RestrictedView`] wraps a store with a fixed whitelist of graph names so
//! each pipeline stage can only see the graphs it is supposed to.

pub mod error;
pub mod store;
pub mod view;

pub use error::{Result, StoreError};
pub use store::{Category, QuadStore};
pub use view::RestrictedView;

// The term model is oxrdf's; re-export the parts the rest of the workspace
// uses so downstream crates depend on one name for them.
pub use oxrdf::{
    BlankNode, GraphName, GraphNameRef, Literal, NamedNode, NamedNodeRef, Quad, Subject, Term,
    Triple,
};
